//! Fuzzy matching primitives shared by the completion engine and the keyword index.
//!
//! The design combines a trigram index for candidate filtering with a fuzzy
//! subsequence scorer for ranking. Matching is ASCII case-insensitive; non-ASCII
//! bytes must match exactly.
//!
//! Three kinds of matches are distinguished and always rank in this order:
//!
//! 1. [`MatchKind::Prefix`]: the candidate starts with the query (`${HO` → `${HOST}`).
//! 2. [`MatchKind::Substring`]: the query occurs inside the candidate
//!    (`custom` → `My Custom Step`).
//! 3. [`MatchKind::Fuzzy`]: the query is a subsequence of the candidate
//!    (`mcs` → `My Custom Step`).

#![forbid(unsafe_code)]

mod rank;
mod scoring;
mod trigram;

pub use rank::{rank, Ranked};
pub use scoring::{fuzzy_match, FuzzyMatcher, MatchKind, MatchScore, RankKey};
pub use trigram::{EntryId, Trigram, TrigramIndex, TrigramIndexBuilder};

/// Case-insensitive substring test used to post-filter ranked candidates.
#[inline]
pub fn contains_ignore_case(candidate: &str, needle: &str) -> bool {
    candidate.to_lowercase().contains(&needle.to_lowercase())
}
