//! The persistent suite an interactive session accumulates, and the merge step
//! that folds one snippet into it.
//!
//! A [`Suite`] owns four name-keyed collections (imports, variables, keywords and
//! tests). After every successful [`merge`] names are unique within each of them;
//! a re-declared name keeps its first position and its latest definition.

mod merge;
mod model;

pub use merge::{merge, CompileError, MergeError, MergeOutcome};
pub use model::{Import, ImportKind, TestCase, TestDefaults, UserKeyword, Variable};
pub use rfi_syntax::{ModeConflict, RunMode};

use rfi_core::{ItemList, ItemListSnapshot};
use rfi_syntax::KeywordCall;
use std::path::{Path, PathBuf};

/// Suite level settings that are not collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteSettings {
    pub documentation: String,
    pub metadata: Vec<(String, String)>,
    pub setup: Option<KeywordCall>,
    pub teardown: Option<KeywordCall>,
}

#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    /// Directory resources and relative paths resolve against.
    pub source: PathBuf,
    /// Mode of the last successfully executed snippet that had tests or tasks.
    pub run_mode: Option<RunMode>,
    pub settings: SuiteSettings,
    pub imports: ItemList<Import>,
    pub variables: ItemList<Variable>,
    pub keywords: ItemList<UserKeyword>,
    pub tests: ItemList<TestCase>,
}

/// Declarations captured before a snippet is merged. Tests are not included.
#[derive(Debug, Clone)]
pub struct SuiteSnapshot {
    settings: SuiteSettings,
    imports: ItemListSnapshot<Import>,
    variables: ItemListSnapshot<Variable>,
    keywords: ItemListSnapshot<UserKeyword>,
}

impl Suite {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            run_mode: None,
            settings: SuiteSettings::default(),
            imports: ItemList::new(),
            variables: ItemList::new(),
            keywords: ItemList::new(),
            tests: ItemList::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn snapshot(&self) -> SuiteSnapshot {
        SuiteSnapshot {
            settings: self.settings.clone(),
            imports: self.imports.snapshot(),
            variables: self.variables.snapshot(),
            keywords: self.keywords.snapshot(),
        }
    }

    /// Put the declarations back to the state captured in `snapshot`.
    pub fn restore(&mut self, snapshot: &SuiteSnapshot) {
        self.settings = snapshot.settings.clone();
        self.imports.restore(&snapshot.imports);
        self.variables.restore(&snapshot.variables);
        self.keywords.restore(&snapshot.keywords);
    }

    pub fn clear_tests(&mut self) {
        self.tests.clear();
    }
}
