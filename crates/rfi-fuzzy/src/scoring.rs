use std::cmp::Ordering;

/// The kind of match that was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// `candidate` starts with `query`.
    Prefix,
    /// `query` occurs contiguously somewhere after the start of `candidate`.
    Substring,
    /// General fuzzy subsequence match.
    Fuzzy,
}

impl MatchKind {
    fn rank(self) -> i32 {
        match self {
            MatchKind::Prefix => 3,
            MatchKind::Substring => 2,
            MatchKind::Fuzzy => 1,
        }
    }
}

/// Score returned by [`fuzzy_match`] and [`FuzzyMatcher::score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub kind: MatchKind,
    pub score: i32,
}

/// Sort key for matches: kind first, then score. Larger is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    kind_rank: i32,
    score: i32,
}

impl MatchScore {
    pub fn rank_key(self) -> RankKey {
        RankKey {
            kind_rank: self.kind.rank(),
            score: self.score,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.kind_rank, self.score).cmp(&(other.kind_rank, other.score))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const MIN_SCORE: i32 = i32::MIN / 4;

const BASE_MATCH: i32 = 10;
const BONUS_WORD_START: i32 = 15;
const BONUS_CONSECUTIVE: i32 = 5;
const BONUS_EXACT_CASE: i32 = 2;
const GAP_PENALTY: i32 = 1;
const LEADING_PENALTY: i32 = 1;
const TRAILING_PENALTY: i32 = 1;

const PREFIX_BASE: i32 = 1_000_000;
const SUBSTRING_BASE: i32 = 500_000;

#[inline]
fn fold(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

/// Bytes that end a "word" in keyword, variable and library names.
#[inline]
fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'_' | b'-' | b'.' | b'/' | b'\\' | b':' | b'{' | b'}' | b'[' | b']' | b'$'
            | b'@' | b'&' | b'%' | b'='
    )
}

#[inline]
fn is_word_start(candidate: &[u8], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = candidate[i - 1];
    let b = candidate[i];
    is_separator(prev)
        || (prev.is_ascii_lowercase() && b.is_ascii_uppercase())
        || (prev.is_ascii_alphabetic() && b.is_ascii_digit())
        || (prev.is_ascii_digit() && b.is_ascii_alphabetic())
}

/// Reusable fuzzy matcher that keeps its DP buffers between candidates.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    query: String,
    query_folded: Vec<u8>,
    dp_prev: Vec<i32>,
    dp_cur: Vec<i32>,
    word_starts: Vec<bool>,
}

impl FuzzyMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            query_folded: query.bytes().map(fold).collect(),
            dp_prev: Vec::new(),
            dp_cur: Vec::new(),
            word_starts: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn score(&mut self, candidate: &str) -> Option<MatchScore> {
        let c = candidate.as_bytes();
        let len = candidate.len().min(PREFIX_BASE as usize / 4) as i32;

        if self.query_folded.is_empty() {
            return Some(MatchScore {
                kind: MatchKind::Prefix,
                score: 0,
            });
        }

        if self.query_folded.len() > c.len() {
            return None;
        }

        if c
            .iter()
            .zip(&self.query_folded)
            .all(|(&cb, &qb)| fold(cb) == qb)
        {
            // Shorter candidates win among prefix matches.
            return Some(MatchScore {
                kind: MatchKind::Prefix,
                score: PREFIX_BASE - len,
            });
        }

        if let Some(pos) = self.find_folded(c) {
            let mut score = SUBSTRING_BASE - (pos as i32) * 4 - len;
            if is_word_start(c, pos) {
                score += BONUS_WORD_START * 10;
            }
            return Some(MatchScore {
                kind: MatchKind::Substring,
                score,
            });
        }

        self.subsequence_score(c).map(|score| MatchScore {
            kind: MatchKind::Fuzzy,
            score,
        })
    }

    fn find_folded(&self, candidate: &[u8]) -> Option<usize> {
        let q = &self.query_folded;
        (1..=candidate.len() - q.len()).find(|&start| {
            candidate[start..start + q.len()]
                .iter()
                .zip(q)
                .all(|(&cb, &qb)| fold(cb) == qb)
        })
    }

    fn subsequence_score(&mut self, candidate: &[u8]) -> Option<i32> {
        let n = candidate.len();
        let query = self.query.as_bytes();

        self.dp_prev.clear();
        self.dp_prev.resize(n, MIN_SCORE);
        self.dp_cur.clear();
        self.dp_cur.resize(n, MIN_SCORE);
        self.word_starts.clear();
        self.word_starts
            .extend((0..n).map(|i| is_word_start(candidate, i)));

        let case_bonus = |q: u8, c: u8| if q == c { BONUS_EXACT_CASE } else { 0 };

        let q0 = query[0];
        let q0_folded = self.query_folded[0];
        for (j, &c) in candidate.iter().enumerate() {
            if fold(c) != q0_folded {
                continue;
            }
            let mut score = BASE_MATCH + case_bonus(q0, c) - LEADING_PENALTY * (j as i32);
            if self.word_starts[j] {
                score += BONUS_WORD_START;
            }
            self.dp_prev[j] = score;
        }

        for i in 1..self.query_folded.len() {
            self.dp_cur.fill(MIN_SCORE);
            let q = query[i];
            let q_folded = self.query_folded[i];

            // Best `dp_prev[k] + GAP_PENALTY * (k + 1)` over all k < j, so the gap
            // penalty for jumping from k to j is applied in O(1).
            let mut running_max = MIN_SCORE;
            for (j, &c) in candidate.iter().enumerate() {
                if j > 0 {
                    let prev = self.dp_prev[j - 1];
                    if prev > MIN_SCORE / 2 {
                        running_max = running_max.max(prev + GAP_PENALTY * (j as i32));
                    }
                }

                if fold(c) != q_folded {
                    continue;
                }

                let gapped = if running_max > MIN_SCORE / 2 {
                    running_max - GAP_PENALTY * (j as i32)
                } else {
                    MIN_SCORE
                };
                let consecutive = if j > 0 && self.dp_prev[j - 1] > MIN_SCORE / 2 {
                    self.dp_prev[j - 1] + BONUS_CONSECUTIVE
                } else {
                    MIN_SCORE
                };
                let best = gapped.max(consecutive);
                if best <= MIN_SCORE / 2 {
                    continue;
                }

                let mut score = best + BASE_MATCH + case_bonus(q, c);
                if self.word_starts[j] {
                    score += BONUS_WORD_START;
                }
                self.dp_cur[j] = score;
            }

            std::mem::swap(&mut self.dp_prev, &mut self.dp_cur);
        }

        self.dp_prev
            .iter()
            .enumerate()
            .filter(|&(_, &score)| score > MIN_SCORE / 2)
            .map(|(j, &score)| score - TRAILING_PENALTY * ((n - 1 - j) as i32))
            .max()
    }
}

/// Fuzzy match `query` against `candidate`.
///
/// Prefix matches always rank above substring matches, which always rank above
/// scattered subsequence matches.
pub fn fuzzy_match(query: &str, candidate: &str) -> Option<MatchScore> {
    FuzzyMatcher::new(query).score(candidate)
}
