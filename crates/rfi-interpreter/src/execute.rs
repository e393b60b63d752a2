use crate::error::{ExecutionError, InterpreterError};
use rfi_runtime::{
    ErrorCapture, Listener, OutputSink, RunContext, StdoutSink, SuiteResult, SuiteRunner,
};
use rfi_suite::{merge, Suite, SuiteSnapshot, TestDefaults};
use std::path::Path;
use tempfile::TempDir;

/// Per-cell knobs for [`execute`].
///
/// The default merges with empty test defaults, prints to the process' standard
/// output, captures errors internally and attaches no listeners.
pub struct ExecuteOptions<'a, 'l> {
    /// Test settings collected while merging this cell only.
    pub defaults: TestDefaults,
    pub stdout: Option<&'a mut dyn OutputSink>,
    /// Error stream handed to the runner. A sink that never reports a failure
    /// from [`OutputSink::take_failure`] disables rollback.
    pub stderr: Option<&'a mut dyn OutputSink>,
    pub listeners: &'a mut [&'l mut dyn Listener],
    /// Parent of the per-run temporary output directory; the system temp dir
    /// when unset.
    pub output_root: Option<&'a Path>,
}

impl Default for ExecuteOptions<'_, '_> {
    fn default() -> Self {
        Self {
            defaults: TestDefaults::default(),
            stdout: None,
            stderr: None,
            listeners: &mut [],
            output_root: None,
        }
    }
}

impl<'a, 'l> ExecuteOptions<'a, 'l> {
    pub fn with_stdout(mut self, stdout: &'a mut dyn OutputSink) -> Self {
        self.stdout = Some(stdout);
        self
    }

    pub fn with_stderr(mut self, stderr: &'a mut dyn OutputSink) -> Self {
        self.stderr = Some(stderr);
        self
    }

    pub fn with_listeners(mut self, listeners: &'a mut [&'l mut dyn Listener]) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn with_output_root(mut self, root: &'a Path) -> Self {
        self.output_root = Some(root);
        self
    }
}

/// Merge `code` into `suite` and run it.
///
/// Returns the runner's result untouched. Compile errors and mode conflicts
/// leave the suite as it was. When the run flushes anything to its error
/// stream, the suite's declarations are restored, every test is cleared and
/// [`InterpreterError::Execution`] is returned.
pub fn execute<R>(
    runner: &mut R,
    code: &str,
    suite: &mut Suite,
    options: ExecuteOptions<'_, '_>,
) -> Result<SuiteResult, InterpreterError>
where
    R: SuiteRunner + ?Sized,
{
    let ExecuteOptions {
        mut defaults,
        stdout,
        stderr,
        listeners,
        output_root,
    } = options;

    let snapshot = suite.snapshot();
    let outcome = merge(code, suite, &mut defaults)?;
    tracing::debug!(
        target: "rfi.interpreter",
        tests = suite.tests.len(),
        new_tests = outcome.new_tests.len(),
        collapsed = outcome.collapsed,
        "merged cell"
    );

    let output_dir = match output_dir(output_root) {
        Ok(dir) => dir,
        Err(err) => {
            roll_back(suite, &snapshot);
            return Err(err.into());
        }
    };

    let mut process_stdout = StdoutSink;
    let stdout: &mut dyn OutputSink = match stdout {
        Some(sink) => sink,
        None => &mut process_stdout,
    };
    let mut capture = ErrorCapture::new();
    let stderr: &mut dyn OutputSink = match stderr {
        Some(sink) => sink,
        None => &mut capture,
    };

    let result = runner.run(
        suite,
        RunContext {
            output_dir: output_dir.path(),
            run_mode: outcome.run_mode,
            stdout: &mut *stdout,
            stderr: &mut *stderr,
            listeners: &mut *listeners,
        },
    );
    stdout.flush();
    stderr.flush();

    // Failures are detected once the run is over, before the caller regains
    // the suite.
    if let Some(message) = stderr.take_failure() {
        roll_back(suite, &snapshot);
        tracing::info!(
            target: "rfi.interpreter",
            suite = %suite.name,
            "cell failed; suite rolled back"
        );
        return Err(ExecutionError { message }.into());
    }

    for listener in listeners.iter_mut() {
        if let Some(indexer) = listener.as_suite_indexer() {
            indexer.import_from_suite(suite);
        }
    }
    suite.clear_tests();
    suite.run_mode = outcome.run_mode;

    if let Err(err) = output_dir.close() {
        tracing::warn!(target: "rfi.interpreter", error = %err, "failed to remove output directory");
    }
    Ok(result)
}

fn output_dir(root: Option<&Path>) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("rfi-run-");
    match root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
}

fn roll_back(suite: &mut Suite, snapshot: &SuiteSnapshot) {
    suite.restore(snapshot);
    suite.clear_tests();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rfi_runtime::{BufferSink, Statistics, Status};

    /// Records what it was asked to run and fails on request.
    #[derive(Default)]
    struct ScriptedRunner {
        fail_with: Option<String>,
        runs: Vec<Vec<String>>,
        saw_output_dir: bool,
    }

    impl SuiteRunner for ScriptedRunner {
        fn run(&mut self, suite: &Suite, mut ctx: RunContext<'_, '_>) -> SuiteResult {
            self.runs
                .push(suite.tests.names().map(str::to_string).collect());
            self.saw_output_dir = ctx.output_dir.is_dir();
            ctx.stdout.write("ran\n", false);
            if let Some(message) = &self.fail_with {
                ctx.stderr.write(message, true);
            }
            SuiteResult {
                name: suite.name.clone(),
                source: suite.source.display().to_string(),
                status: Status::Pass,
                message: String::new(),
                tests: Vec::new(),
                statistics: Statistics::default(),
                elapsed_ms: 0,
            }
        }
    }

    #[test]
    fn runs_only_the_cell_tests() {
        let mut runner = ScriptedRunner::default();
        let mut suite = Suite::new("Session", ".");
        let mut out = BufferSink::new();

        execute(
            &mut runner,
            "*** Test Cases ***\nA\n    No Operation\n",
            &mut suite,
            ExecuteOptions::default().with_stdout(&mut out),
        )
        .unwrap();
        execute(
            &mut runner,
            "*** Test Cases ***\nB\n    No Operation\n",
            &mut suite,
            ExecuteOptions::default().with_stdout(&mut out),
        )
        .unwrap();

        assert_eq!(runner.runs, vec![vec!["A"], vec!["B"]]);
        assert!(runner.saw_output_dir);
        assert_eq!(out.text(), "ran\nran\n");
        assert!(suite.tests.is_empty());
    }

    #[test]
    fn flushed_errors_roll_back() {
        let mut runner = ScriptedRunner::default();
        let mut suite = Suite::new("Session", ".");
        let mut out = BufferSink::new();
        execute(
            &mut runner,
            "*** Variables ***\n${A}    1\n",
            &mut suite,
            ExecuteOptions::default().with_stdout(&mut out),
        )
        .unwrap();

        runner.fail_with = Some("boom\n".to_string());
        let err = execute(
            &mut runner,
            "*** Variables ***\n${B}    2\n*** Test Cases ***\nT\n    No Operation\n",
            &mut suite,
            ExecuteOptions::default().with_stdout(&mut out),
        )
        .unwrap_err();

        assert!(err.rolled_back());
        assert_eq!(err.to_string(), "boom\n");
        let names: Vec<&str> = suite.variables.names().collect();
        assert_eq!(names, vec!["${A}"]);
        assert!(suite.tests.is_empty());
        assert_eq!(suite.run_mode, None);
    }

    #[test]
    fn a_non_capturing_stderr_never_fails() {
        let mut runner = ScriptedRunner {
            fail_with: Some("noise\n".to_string()),
            ..ScriptedRunner::default()
        };
        let mut suite = Suite::new("Session", ".");
        let mut out = BufferSink::new();
        let mut err = BufferSink::new();
        execute(
            &mut runner,
            "*** Variables ***\n${A}    1\n",
            &mut suite,
            ExecuteOptions::default()
                .with_stdout(&mut out)
                .with_stderr(&mut err),
        )
        .unwrap();
        assert_eq!(err.text(), "noise\n");
        assert!(suite.variables.contains("${A}"));
    }

    #[test]
    fn output_directories_live_under_the_root_and_are_removed() {
        let root = tempfile::tempdir().unwrap();
        let mut runner = ScriptedRunner::default();
        let mut suite = Suite::new("Session", ".");
        let mut out = BufferSink::new();
        execute(
            &mut runner,
            "*** Test Cases ***\nT\n    No Operation\n",
            &mut suite,
            ExecuteOptions::default()
                .with_stdout(&mut out)
                .with_output_root(root.path()),
        )
        .unwrap();
        assert!(runner.saw_output_dir);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn a_missing_output_root_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let mut runner = ScriptedRunner::default();
        let mut suite = Suite::new("Session", ".");
        let err = execute(
            &mut runner,
            "*** Variables ***\n${A}    1\n",
            &mut suite,
            ExecuteOptions::default().with_output_root(&missing),
        )
        .unwrap_err();
        assert!(matches!(err, InterpreterError::Io(_)));
        assert!(suite.variables.is_empty());
        assert!(runner.runs.is_empty());
    }
}
