use crate::doc::KeywordDoc;
use crate::search::KeywordIndex;
use rfi_runtime::{LibraryDoc, Listener, SuiteIndexer};
use rfi_suite::Suite;

/// Listener that keeps a [`KeywordIndex`] of everything successful runs saw.
///
/// Libraries and resources imported during a run are staged; they reach the
/// index only when the run is committed through
/// [`SuiteIndexer::import_from_suite`], together with the suite's own
/// keywords. A run that is never committed leaves the index untouched, and its
/// staged docs are dropped when the next run starts.
#[derive(Debug, Default)]
pub struct KeywordIndexer {
    index: KeywordIndex,
    staged: Vec<KeywordDoc>,
}

impl KeywordIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    /// Every indexed keyword, in the order it was first seen.
    pub fn keywords(&self) -> &[KeywordDoc] {
        self.index.as_slice()
    }

    /// Docs waiting for the current run to be committed.
    pub fn staged(&self) -> &[KeywordDoc] {
        &self.staged
    }

    fn stage(&mut self, library: &LibraryDoc) {
        self.staged.extend(KeywordDoc::from_library(library));
    }
}

impl Listener for KeywordIndexer {
    fn start_suite(&mut self, _suite: &Suite) {
        if !self.staged.is_empty() {
            tracing::debug!(
                target: "rfi.index",
                dropped = self.staged.len(),
                "discarding keywords staged by an uncommitted run"
            );
            self.staged.clear();
        }
    }

    fn library_import(&mut self, library: &LibraryDoc) {
        self.stage(library);
    }

    fn resource_import(&mut self, resource: &LibraryDoc) {
        self.stage(resource);
    }

    fn as_suite_indexer(&mut self) -> Option<&mut dyn SuiteIndexer> {
        Some(self)
    }
}

impl SuiteIndexer for KeywordIndexer {
    fn import_from_suite(&mut self, suite: &Suite) {
        let mut docs = std::mem::take(&mut self.staged);
        docs.extend(
            suite
                .keywords
                .iter()
                .map(|keyword| KeywordDoc::from_user_keyword(keyword, &suite.name)),
        );
        let changed = self.index.refresh(docs);
        tracing::debug!(
            target: "rfi.index",
            suite = %suite.name,
            changed,
            total = self.index.len(),
            "keyword index refreshed"
        );
    }
}
