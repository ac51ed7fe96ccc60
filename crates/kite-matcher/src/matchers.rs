use std::cmp::Ordering;
use std::collections::HashSet;

use kite_source::ParsedSource;

use crate::candidate::CandidateUnit;

/// Filters and orders candidates for one query.
pub trait Matcher: Send + Sync {
    fn matches(&self, candidate: &CandidateUnit) -> bool;

    fn compare(&self, a: &CandidateUnit, b: &CandidateUnit) -> Ordering;

    /// Whether [`compare`](Self::compare) puts the best candidates last.
    fn best_last(&self) -> bool {
        false
    }
}

/// Classes the current source imports, by FQCN.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    imported: HashSet<String>,
    packages: Vec<String>,
}

impl ImportContext {
    pub fn from_source(source: &ParsedSource) -> Self {
        Self {
            imported: source.imports.values().cloned().collect(),
            packages: source.wildcard_imports.clone(),
        }
    }

    /// Single-type imports and members of on-demand imported packages.
    pub fn is_imported(&self, candidate: &CandidateUnit) -> bool {
        let Some(fqcn) = candidate.fqcn.as_deref() else {
            return false;
        };
        self.imported.contains(fqcn)
            || self
                .packages
                .iter()
                .any(|package| kite_core::package_name(fqcn) == package)
    }
}

/// Literal-prefix ordering shared by the prefix, contains and camel-case
/// matchers: prefix matches first, then imported names, then shorter names
/// among prefix matches, then lexicographic.
fn compare_by_prefix(query: &str, imports: &ImportContext, a: &CandidateUnit, b: &CandidateUnit) -> Ordering {
    let a_prefix = a.name.starts_with(query);
    let b_prefix = b.name.starts_with(query);
    b_prefix
        .cmp(&a_prefix)
        .then_with(|| imports.is_imported(b).cmp(&imports.is_imported(a)))
        .then_with(|| {
            if a_prefix && b_prefix {
                a.name.len().cmp(&b.name.len())
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.declaration.cmp(&b.declaration))
}

#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    query: String,
    partial: bool,
    imports: ImportContext,
}

impl PrefixMatcher {
    /// `partial` accepts names starting with the query; otherwise only exact
    /// names are accepted.
    pub fn new(query: impl Into<String>, partial: bool) -> Self {
        Self {
            query: query.into(),
            partial,
            imports: ImportContext::default(),
        }
    }

    pub fn with_imports(mut self, imports: ImportContext) -> Self {
        self.imports = imports;
        self
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, candidate: &CandidateUnit) -> bool {
        if self.partial {
            return candidate.name.starts_with(&self.query);
        }
        candidate.name == self.query
            || candidate
                .name
                .rsplit(|c| c == kite_core::INNER_CLASS_MARKER || c == '.')
                .next()
                .is_some_and(|tail| tail == self.query)
            || candidate.declaration == self.query
    }

    fn compare(&self, a: &CandidateUnit, b: &CandidateUnit) -> Ordering {
        compare_by_prefix(&self.query, &self.imports, a, b)
    }
}

#[derive(Debug, Clone)]
pub struct ContainsMatcher {
    query: String,
    imports: ImportContext,
}

impl ContainsMatcher {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            imports: ImportContext::default(),
        }
    }

    pub fn with_imports(mut self, imports: ImportContext) -> Self {
        self.imports = imports;
        self
    }
}

impl Matcher for ContainsMatcher {
    fn matches(&self, candidate: &CandidateUnit) -> bool {
        candidate.name.contains(&self.query)
    }

    fn compare(&self, a: &CandidateUnit, b: &CandidateUnit) -> Ordering {
        compare_by_prefix(&self.query, &self.imports, a, b)
    }
}

#[derive(Debug, Clone)]
pub struct CamelCaseMatcher {
    query: String,
    imports: ImportContext,
}

impl CamelCaseMatcher {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            imports: ImportContext::default(),
        }
    }

    pub fn with_imports(mut self, imports: ImportContext) -> Self {
        self.imports = imports;
        self
    }
}

impl Matcher for CamelCaseMatcher {
    fn matches(&self, candidate: &CandidateUnit) -> bool {
        camel_case_matches(&self.query, &candidate.name)
    }

    fn compare(&self, a: &CandidateUnit, b: &CandidateUnit) -> Ordering {
        compare_by_prefix(&self.query, &self.imports, a, b)
    }
}

/// Camel-hump match of `query` against `name`.
///
/// The first character must match exactly. Each later upper-case query
/// letter must land on an upper-case letter at the first case-insensitive
/// occurrence after the previous match; any other query character must
/// follow the previous match directly.
pub fn camel_case_matches(query: &str, name: &str) -> bool {
    let query: Vec<char> = query.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let Some(&first) = query.first() else {
        return true;
    };
    if name.first() != Some(&first) {
        return false;
    }

    let mut pos = 0usize;
    for &qc in &query[1..] {
        if qc.is_uppercase() {
            let folded = fold(qc);
            let Some(offset) = name[pos + 1..].iter().position(|&c| fold(c) == folded) else {
                return false;
            };
            let at = pos + 1 + offset;
            if name[at] != qc {
                return false;
            }
            pos = at;
        } else {
            if name.get(pos + 1) != Some(&qc) {
                return false;
            }
            pos += 1;
        }
    }
    true
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    query: String,
    first_char_exact: bool,
}

impl FuzzyMatcher {
    pub fn new(query: impl Into<String>, first_char_exact: bool) -> Self {
        Self {
            query: query.into(),
            first_char_exact,
        }
    }

    pub fn score(&self, name: &str) -> Option<u32> {
        fuzzy_score(&self.query, name, self.first_char_exact)
    }
}

impl Matcher for FuzzyMatcher {
    fn matches(&self, candidate: &CandidateUnit) -> bool {
        self.score(&candidate.name).is_some()
    }

    /// Ascending score; unmatched candidates sort first.
    fn compare(&self, a: &CandidateUnit, b: &CandidateUnit) -> Ordering {
        self.score(&a.name)
            .cmp(&self.score(&b.name))
            .then_with(|| b.name.cmp(&a.name))
    }

    fn best_last(&self) -> bool {
        true
    }
}

/// Greedy subsequence alignment score of `query` in `name`.
///
/// Each matched character earns 1 when its position equals its query
/// position, 2 when it directly follows the previous match and 2 when it is
/// upper case. Scores at or below twice the query length are rejected.
pub fn fuzzy_score(query: &str, name: &str, first_char_exact: bool) -> Option<u32> {
    let query: Vec<char> = query.chars().collect();
    let name: Vec<char> = name.chars().collect();
    if query.is_empty() {
        return Some(0);
    }
    if first_char_exact && name.first() != query.first() {
        return None;
    }

    let mut score = 0u32;
    let mut next = 0usize;
    let mut previous: Option<usize> = None;
    for (i, &qc) in query.iter().enumerate() {
        let folded = fold(qc);
        let offset = name.get(next..)?.iter().position(|&c| fold(c) == folded)?;
        let at = next + offset;
        if at == i {
            score += 1;
        }
        if previous.is_some_and(|p| p + 1 == at) {
            score += 2;
        }
        if name[at].is_uppercase() {
            score += 2;
        }
        previous = Some(at);
        next = at + 1;
    }

    let threshold = 2 * query.len() as u32;
    (score > threshold).then_some(score)
}
