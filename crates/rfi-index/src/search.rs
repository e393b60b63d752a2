use crate::doc::{DocKey, KeywordDoc};
use rfi_fuzzy::{EntryId, FuzzyMatcher, MatchScore, TrigramIndex, TrigramIndexBuilder};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Scan cap for short queries whose first byte has no bucket.
const FULL_SCAN_LIMIT: usize = 50_000;

/// A keyword that matched a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub doc: &'a KeywordDoc,
    pub score: MatchScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStrategy {
    Prefix,
    Trigram,
    FullScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub strategy: CandidateStrategy,
    pub candidates_considered: usize,
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    id: EntryId,
    score: MatchScore,
}

/// Fuzzy-searchable keyword documentation.
///
/// Entries are keyed by [`KeywordDoc::key`]; [`KeywordIndex::refresh`] replaces
/// an entry in place and appends unseen ones, so iteration order is the order
/// keywords were first indexed. Queries match the keyword name or its
/// `Source.Name` form.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: Vec<KeywordDoc>,
    positions: HashMap<DocKey, usize>,
    trigram: TrigramIndex,
    /// Entry ids by first ASCII-lowercased byte of the name or qualified name.
    prefix1: Vec<Vec<EntryId>>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(docs: impl IntoIterator<Item = KeywordDoc>) -> Self {
        let mut index = Self::new();
        index.refresh(docs);
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeywordDoc> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[KeywordDoc] {
        &self.entries
    }

    pub fn get(&self, source: &str, name: &str) -> Option<&KeywordDoc> {
        let key = DocKey {
            source: rfi_core::normalize_name(source),
            name: rfi_core::normalize_name(name),
        };
        self.positions.get(&key).map(|&ix| &self.entries[ix])
    }

    /// Insert `docs`, replacing entries with the same key. Returns how many
    /// entries were added or changed.
    pub fn refresh(&mut self, docs: impl IntoIterator<Item = KeywordDoc>) -> usize {
        let mut changed = 0;
        for doc in docs {
            let key = doc.key();
            match self.positions.get(&key) {
                Some(&ix) if self.entries[ix] == doc => {}
                Some(&ix) => {
                    self.entries[ix] = doc;
                    changed += 1;
                }
                None => {
                    self.positions.insert(key, self.entries.len());
                    self.entries.push(doc);
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.rebuild();
        }
        changed
    }

    fn rebuild(&mut self) {
        let mut builder = TrigramIndexBuilder::new();
        let mut prefix1: Vec<Vec<EntryId>> = vec![Vec::new(); 256];
        for (id, doc) in self.entries.iter().enumerate() {
            let id = id as EntryId;
            let qualified = doc.qualified_name();
            builder.insert(id, &doc.name);
            builder.insert(id, &qualified);

            let name_key = first_key(&doc.name);
            if let Some(key) = name_key {
                prefix1[key as usize].push(id);
            }
            if let Some(key) = first_key(&qualified).filter(|key| Some(*key) != name_key) {
                prefix1[key as usize].push(id);
            }
        }
        self.trigram = builder.build();
        self.prefix1 = prefix1;
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        self.search_with_stats(query, limit).0
    }

    /// Best `limit` matches for `query`, best first.
    ///
    /// Ties are broken by shorter name, then name, then source, so results do
    /// not depend on insertion order. An empty query matches nothing.
    pub fn search_with_stats(
        &self,
        query: &str,
        limit: usize,
    ) -> (Vec<SearchHit<'_>>, SearchStats) {
        let bytes = query.as_bytes();
        let Some(&first) = bytes.first() else {
            return (
                Vec::new(),
                SearchStats {
                    strategy: CandidateStrategy::FullScan,
                    candidates_considered: 0,
                },
            );
        };

        let trigram_ids = if bytes.len() >= 3 {
            self.trigram.candidates(query)
        } else {
            Vec::new()
        };
        let bucket = self
            .prefix1
            .get(first.to_ascii_lowercase() as usize)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let scan: Vec<EntryId>;
        let (strategy, ids): (CandidateStrategy, &[EntryId]) = if !trigram_ids.is_empty() {
            (CandidateStrategy::Trigram, trigram_ids.as_slice())
        } else if !bucket.is_empty() {
            // No trigram hit still allows acronym-style matches starting with the same byte.
            (CandidateStrategy::Prefix, bucket)
        } else {
            scan = (0..self.entries.len().min(FULL_SCAN_LIMIT))
                .map(|id| id as EntryId)
                .collect();
            (CandidateStrategy::FullScan, scan.as_slice())
        };
        let stats = SearchStats {
            strategy,
            candidates_considered: ids.len(),
        };
        if limit == 0 {
            return (Vec::new(), stats);
        }

        let mut matcher = FuzzyMatcher::new(query);
        let mut scored: Vec<Scored> = ids
            .iter()
            .filter_map(|&id| {
                self.score_entry(id, &mut matcher)
                    .map(|score| Scored { id, score })
            })
            .collect();

        if scored.len() > limit {
            scored.select_nth_unstable_by(limit, |a, b| self.cmp_scored(a, b));
            scored.truncate(limit);
        }
        scored.sort_by(|a, b| self.cmp_scored(a, b));

        tracing::trace!(
            target: "rfi.index",
            query,
            ?strategy,
            considered = stats.candidates_considered,
            matched = scored.len(),
            "keyword search"
        );
        let hits = scored
            .into_iter()
            .map(|hit| SearchHit {
                doc: &self.entries[hit.id as usize],
                score: hit.score,
            })
            .collect();
        (hits, stats)
    }

    fn score_entry(&self, id: EntryId, matcher: &mut FuzzyMatcher) -> Option<MatchScore> {
        let doc = &self.entries[id as usize];
        let name = matcher.score(&doc.name);
        let qualified = matcher.score(&doc.qualified_name());
        match (name, qualified) {
            (Some(a), Some(b)) if b.rank_key() > a.rank_key() => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        }
    }

    fn cmp_scored(&self, a: &Scored, b: &Scored) -> Ordering {
        let a_doc = &self.entries[a.id as usize];
        let b_doc = &self.entries[b.id as usize];
        b.score
            .rank_key()
            .cmp(&a.score.rank_key())
            .then_with(|| a_doc.name.len().cmp(&b_doc.name.len()))
            .then_with(|| a_doc.name.cmp(&b_doc.name))
            .then_with(|| a_doc.source.cmp(&b_doc.source))
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn first_key(text: &str) -> Option<u8> {
    text.as_bytes().first().map(u8::to_ascii_lowercase)
}
