use crate::{FuzzyMatcher, MatchScore};

/// A candidate that matched a query, with its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked<'a> {
    pub candidate: &'a str,
    pub score: MatchScore,
}

/// Score every candidate against `query` and return the matches best-first.
///
/// Ties are broken by shorter candidate, then lexicographically, so the output
/// is deterministic regardless of the input order. Duplicate candidates are
/// reported once.
pub fn rank<'a, I>(query: &str, candidates: I) -> Vec<Ranked<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matcher = FuzzyMatcher::new(query);
    let mut out: Vec<Ranked<'a>> = candidates
        .into_iter()
        .filter_map(|candidate| {
            matcher
                .score(candidate)
                .map(|score| Ranked { candidate, score })
        })
        .collect();

    out.sort_by(|a, b| {
        b.score
            .rank_key()
            .cmp(&a.score.rank_key())
            .then_with(|| a.candidate.len().cmp(&b.candidate.len()))
            .then_with(|| a.candidate.cmp(b.candidate))
    });
    out.dedup_by(|a, b| a.candidate == b.candidate);
    out
}
