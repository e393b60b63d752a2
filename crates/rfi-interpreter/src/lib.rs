//! Incremental execution of test snippets against a persistent suite.
//!
//! An interactive session owns one [`Suite`] (see [`init_suite`]) and feeds it
//! one cell at a time through [`execute`]:
//!
//! 1. the cell is merged into the suite; compile errors and mixed test/task
//!    sections are returned before anything changes;
//! 2. the whole suite runs through a [`SuiteRunner`] in a fresh temporary output
//!    directory. Tests are cleared after every run, so only the cell's tests
//!    execute;
//! 3. anything the runner flushed to its error stream fails the cell. The
//!    suite's imports, variables and keywords are restored to their state before
//!    the cell and the error is returned;
//! 4. on success, listeners that index keywords ingest the suite.
//!
//! [`complete`] offers completions for a cell against the same suite.

mod error;
mod execute;

pub use error::{ExecutionError, InterpreterError};
pub use execute::{execute, ExecuteOptions};

pub use rfi_completion::CompletionReply;
pub use rfi_runtime::{SuiteResult, SuiteRunner};
pub use rfi_suite::Suite;

use rfi_completion::CompletionRequest;
use rfi_index::KeywordIndexer;
use std::path::Path;

/// A new, empty session suite. Relative paths in cells resolve against
/// `source_dir`, which defaults to the current directory.
pub fn init_suite(name: &str, source_dir: Option<&Path>) -> Suite {
    let source = match source_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| ".".into()),
    };
    tracing::debug!(target: "rfi.interpreter", name, source = %source.display(), "new suite");
    Suite::new(name, source)
}

/// Completions for `code` at `cursor` (in characters; `None` is the end).
///
/// Keywords are completed from `indexer` when one is given. Never fails.
pub fn complete(
    code: &str,
    cursor: Option<usize>,
    suite: &Suite,
    indexer: Option<&KeywordIndexer>,
    extra_libraries: &[String],
) -> CompletionReply {
    let request = CompletionRequest::new(code, suite)
        .with_cursor(cursor)
        .with_index(indexer.map(KeywordIndexer::index))
        .with_extra_libraries(extra_libraries);
    rfi_completion::complete(&request)
}
