/// Identifier of an entry stored in a [`TrigramIndex`].
pub type EntryId = u32;

/// A packed, ASCII case-folded 3-byte trigram: `b0 << 16 | b1 << 8 | b2`.
pub type Trigram = u32;

fn trigrams(text: &str, out: &mut Vec<Trigram>) {
    out.extend(text.as_bytes().windows(3).map(|w| {
        ((w[0].to_ascii_lowercase() as u32) << 16)
            | ((w[1].to_ascii_lowercase() as u32) << 8)
            | (w[2].to_ascii_lowercase() as u32)
    }));
}

/// Compact trigram → posting-list index.
#[derive(Debug, Clone, Default)]
pub struct TrigramIndex {
    keys: Vec<Trigram>,
    /// Offsets into `values`; `offsets.len() == keys.len() + 1`.
    offsets: Vec<u32>,
    values: Vec<EntryId>,
}

impl TrigramIndex {
    /// Sorted posting list for `trigram`.
    pub fn postings(&self, trigram: Trigram) -> &[EntryId] {
        match self.keys.binary_search(&trigram) {
            Ok(ix) => &self.values[self.offsets[ix] as usize..self.offsets[ix + 1] as usize],
            Err(_) => &[],
        }
    }

    /// Entries containing every trigram of `query`, sorted and without duplicates.
    ///
    /// Queries shorter than three bytes have no trigrams and yield nothing; callers
    /// fall back to another candidate source for those.
    pub fn candidates(&self, query: &str) -> Vec<EntryId> {
        let mut grams = Vec::new();
        trigrams(query, &mut grams);
        grams.sort_unstable();
        grams.dedup();

        let mut lists: Vec<&[EntryId]> = Vec::with_capacity(grams.len());
        for gram in grams {
            let list = self.postings(gram);
            if list.is_empty() {
                // A query trigram that never occurs rules out every entry.
                return Vec::new();
            }
            lists.push(list);
        }

        // Rarest first keeps the intersection cheap.
        lists.sort_by_key(|list| list.len());
        let Some((base, rest)) = lists.split_first() else {
            return Vec::new();
        };

        base.iter()
            .copied()
            .filter(|id| rest.iter().all(|other| other.binary_search(id).is_ok()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TrigramIndexBuilder {
    /// `(trigram << 32) | id`
    pairs: Vec<u64>,
    scratch: Vec<Trigram>,
}

impl TrigramIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntryId, text: &str) {
        self.scratch.clear();
        trigrams(text, &mut self.scratch);
        self.pairs
            .extend(self.scratch.iter().map(|&g| ((g as u64) << 32) | id as u64));
    }

    pub fn build(mut self) -> TrigramIndex {
        self.pairs.sort_unstable();
        self.pairs.dedup();

        let mut index = TrigramIndex {
            keys: Vec::new(),
            offsets: vec![0],
            values: Vec::with_capacity(self.pairs.len()),
        };

        for pair in self.pairs {
            let trigram = (pair >> 32) as Trigram;
            let id = pair as EntryId;
            if index.keys.last() != Some(&trigram) {
                if !index.keys.is_empty() {
                    index.offsets.push(index.values.len() as u32);
                }
                index.keys.push(trigram);
            }
            index.values.push(id);
        }
        if !index.keys.is_empty() {
            index.offsets.push(index.values.len() as u32);
        }

        debug_assert_eq!(index.offsets.len(), index.keys.len() + 1);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn candidates_intersect_postings() {
        let mut builder = TrigramIndexBuilder::new();
        builder.insert(1, "Log Many");
        builder.insert(2, "Set Log Level");
        builder.insert(3, "Should Be Equal");
        let index = builder.build();

        assert_eq!(index.candidates("log"), vec![1, 2]);
        assert_eq!(index.candidates("log l"), vec![2]);
        assert_eq!(index.candidates("zzz"), Vec::<EntryId>::new());
    }

    #[test]
    fn trigrams_are_case_folded() {
        let mut builder = TrigramIndexBuilder::new();
        builder.insert(7, "Collections");
        let index = builder.build();

        assert_eq!(index.candidates("LECT"), vec![7]);
        assert_eq!(index.candidates("co"), Vec::<EntryId>::new());
    }
}
