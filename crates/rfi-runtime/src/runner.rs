use crate::listener::{LibraryDoc, Listener};
use crate::result::{SuiteResult, TestResult};
use crate::sink::OutputSink;
use rfi_suite::{RunMode, Suite};
use std::path::Path;

/// Everything a runner may touch during one run.
pub struct RunContext<'a, 'l> {
    /// Scratch directory owned by the caller for the duration of the run.
    pub output_dir: &'a Path,
    /// Mode of the snippet being run; `None` when it has no tests or tasks.
    pub run_mode: Option<RunMode>,
    pub stdout: &'a mut dyn OutputSink,
    /// Diagnostics written here and flushed mark the run as failed.
    pub stderr: &'a mut dyn OutputSink,
    pub listeners: &'a mut [&'l mut dyn Listener],
}

impl<'l> RunContext<'_, 'l> {
    /// A context borrowing this one, for handing to code that holds it for a
    /// shorter time than the run.
    pub fn reborrow(&mut self) -> RunContext<'_, 'l> {
        RunContext {
            output_dir: self.output_dir,
            run_mode: self.run_mode,
            stdout: &mut *self.stdout,
            stderr: &mut *self.stderr,
            listeners: &mut *self.listeners,
        }
    }

    pub(crate) fn notify(&mut self, mut event: impl FnMut(&mut dyn Listener)) {
        for listener in self.listeners.iter_mut() {
            event(&mut **listener);
        }
    }

    pub(crate) fn start_suite(&mut self, suite: &Suite) {
        self.notify(|l| l.start_suite(suite));
    }

    pub(crate) fn end_suite(&mut self, result: &SuiteResult) {
        self.notify(|l| l.end_suite(result));
    }

    pub(crate) fn start_test(&mut self, name: &str) {
        self.notify(|l| l.start_test(name));
    }

    pub(crate) fn end_test(&mut self, result: &TestResult) {
        self.notify(|l| l.end_test(result));
    }

    pub(crate) fn library_import(&mut self, doc: &LibraryDoc) {
        self.notify(|l| l.library_import(doc));
    }

    pub(crate) fn resource_import(&mut self, doc: &LibraryDoc) {
        self.notify(|l| l.resource_import(doc));
    }

    /// Write a diagnostic and flush it, which marks the run as failed.
    pub(crate) fn error(&mut self, text: &str) {
        let mut line = text.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        self.stderr.write(&line, true);
    }
}

/// Executes a whole suite.
///
/// Runners report problems by writing to [`RunContext::stderr`] and flushing;
/// the returned result is passed through to the caller untouched.
pub trait SuiteRunner {
    fn run(&mut self, suite: &Suite, ctx: RunContext<'_, '_>) -> SuiteResult;
}

impl<R: SuiteRunner + ?Sized> SuiteRunner for &mut R {
    fn run(&mut self, suite: &Suite, ctx: RunContext<'_, '_>) -> SuiteResult {
        (**self).run(suite, ctx)
    }
}
