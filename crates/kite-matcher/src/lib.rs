//! Candidate matching for completion and "search everywhere".
//!
//! A [`Matcher`] filters [`CandidateUnit`]s against a query and orders the
//! survivors. [`matcher_for`] picks the matcher for a [`MatchRequest`] and
//! [`rank`] applies it.

mod candidate;
mod matchers;
mod mode;

pub use candidate::{CandidateKind, CandidateUnit};
pub use matchers::{
    camel_case_matches, fuzzy_score, CamelCaseMatcher, ContainsMatcher, FuzzyMatcher, ImportContext,
    Matcher, PrefixMatcher,
};
pub use mode::{matcher_for, rank, MatchMode, MatchRequest};
