//! Runtime contracts for executing a suite, plus a small reference runtime.
//!
//! Orchestration code only depends on the traits in this crate:
//!
//! - [`SuiteRunner`] executes a [`rfi_suite::Suite`] and returns a [`SuiteResult`].
//! - [`OutputSink`] receives console output and diagnostics. [`ErrorCapture`]
//!   accumulates diagnostics and seals them into a failure on flush.
//! - [`Listener`] observes runs; listeners that index keywords expose a
//!   [`SuiteIndexer`] facet.
//!
//! [`BasicRunner`] implements [`SuiteRunner`] with a handful of standard
//! libraries (`BuiltIn`, `Collections`, `String`, `OperatingSystem`). It writes
//! test failures and execution errors to stderr, so a failing run can be told
//! apart from a passing one without inspecting the result.

mod basic;
mod listener;
mod result;
mod runner;
mod sink;

pub use basic::{parse_time, BasicRunner, Value};
pub use listener::{DocSource, KeywordSpec, LibraryDoc, Listener, SuiteIndexer};
pub use result::{LogMessage, Statistics, Status, SuiteResult, TestResult};
pub use runner::{RunContext, SuiteRunner};
pub use sink::{BufferSink, ErrorCapture, OutputSink, StdoutSink};

/// Name of the result file a run writes into its output directory.
pub const OUTPUT_FILE: &str = "output.json";
