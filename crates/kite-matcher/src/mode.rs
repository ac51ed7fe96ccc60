use kite_source::ParsedSource;
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateUnit;
use crate::matchers::{
    CamelCaseMatcher, ContainsMatcher, FuzzyMatcher, ImportContext, Matcher, PrefixMatcher,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Prefix,
    Exact,
    Contains,
    CamelCase,
    Fuzzy,
    /// Camel-case when the query has an upper-case letter after its first
    /// character, prefix otherwise.
    #[default]
    Auto,
}

impl MatchMode {
    /// The concrete mode `query` runs under.
    pub fn resolve(self, query: &str) -> MatchMode {
        match self {
            MatchMode::Auto => {
                if query.chars().skip(1).any(char::is_uppercase) {
                    MatchMode::CamelCase
                } else {
                    MatchMode::Prefix
                }
            }
            mode => mode,
        }
    }
}

/// A completion or search request, as far as candidate selection goes.
#[derive(Debug, Clone)]
pub struct MatchRequest<'a> {
    pub query: String,
    pub mode: MatchMode,
    pub fuzzy_first_char_exact: bool,
    /// The file under the cursor; its imports are preferred when ranking.
    pub source: Option<&'a ParsedSource>,
}

impl<'a> MatchRequest<'a> {
    pub fn new(query: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            query: query.into(),
            mode,
            fuzzy_first_char_exact: true,
            source: None,
        }
    }

    pub fn with_source(mut self, source: &'a ParsedSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_fuzzy_first_char_exact(mut self, exact: bool) -> Self {
        self.fuzzy_first_char_exact = exact;
        self
    }
}

/// The matcher and comparator pair for `request`.
pub fn matcher_for(request: &MatchRequest<'_>) -> Box<dyn Matcher> {
    let imports = request
        .source
        .map(ImportContext::from_source)
        .unwrap_or_default();
    let query = request.query.clone();
    match request.mode.resolve(&request.query) {
        MatchMode::Prefix | MatchMode::Auto => Box::new(PrefixMatcher::new(query, true).with_imports(imports)),
        MatchMode::Exact => Box::new(PrefixMatcher::new(query, false).with_imports(imports)),
        MatchMode::Contains => Box::new(ContainsMatcher::new(query).with_imports(imports)),
        MatchMode::CamelCase => Box::new(CamelCaseMatcher::new(query).with_imports(imports)),
        MatchMode::Fuzzy => Box::new(FuzzyMatcher::new(query, request.fuzzy_first_char_exact)),
    }
}

/// Keep the candidates `matcher` accepts, best first, at most `limit` of them.
pub fn rank<I>(candidates: I, matcher: &dyn Matcher, limit: Option<usize>) -> Vec<CandidateUnit>
where
    I: IntoIterator<Item = CandidateUnit>,
{
    let mut out: Vec<CandidateUnit> = candidates
        .into_iter()
        .filter(|candidate| matcher.matches(candidate))
        .collect();
    if matcher.best_last() {
        out.sort_by(|a, b| matcher.compare(b, a));
    } else {
        out.sort_by(|a, b| matcher.compare(a, b));
    }
    out.dedup();
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}
