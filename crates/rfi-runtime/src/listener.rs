use crate::result::{SuiteResult, TestResult};
use rfi_suite::Suite;

/// Where a keyword definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocSource {
    Library,
    Resource,
}

/// Documentation of one keyword, as reported to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec {
    pub name: String,
    pub args: Vec<String>,
    pub doc: String,
    pub tags: Vec<String>,
}

/// A library or resource file imported during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDoc {
    /// Name keywords are qualified with (`BuiltIn`, `common`).
    pub name: String,
    pub source: DocSource,
    pub doc: String,
    pub keywords: Vec<KeywordSpec>,
}

/// Observes a run. Every hook defaults to doing nothing.
pub trait Listener {
    fn start_suite(&mut self, _suite: &Suite) {}

    fn end_suite(&mut self, _result: &SuiteResult) {}

    fn start_test(&mut self, _name: &str) {}

    fn end_test(&mut self, _result: &TestResult) {}

    fn library_import(&mut self, _library: &LibraryDoc) {}

    fn resource_import(&mut self, _resource: &LibraryDoc) {}

    /// Listeners that index keywords expose that facet here.
    fn as_suite_indexer(&mut self) -> Option<&mut dyn SuiteIndexer> {
        None
    }
}

/// Ingests what a successful run learned about the suite.
pub trait SuiteIndexer {
    fn import_from_suite(&mut self, suite: &Suite);
}
