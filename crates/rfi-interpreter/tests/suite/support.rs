use rfi_interpreter::{execute, init_suite, ExecuteOptions, InterpreterError, Suite, SuiteResult};
use rfi_runtime::{BasicRunner, BufferSink, Listener};
use tempfile::TempDir;

/// One interactive session backed by the reference runtime.
pub struct Session {
    pub dir: TempDir,
    pub suite: Suite,
    pub runner: BasicRunner,
    pub stdout: BufferSink,
}

impl Session {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let suite = init_suite("Session", Some(dir.path()));
        Self {
            dir,
            suite,
            runner: BasicRunner::new(),
            stdout: BufferSink::new(),
        }
    }

    pub fn run(&mut self, cell: &str) -> Result<SuiteResult, InterpreterError> {
        self.run_with(cell, &mut [])
    }

    pub fn run_with(
        &mut self,
        cell: &str,
        listeners: &mut [&mut dyn Listener],
    ) -> Result<SuiteResult, InterpreterError> {
        let options = ExecuteOptions::default()
            .with_stdout(&mut self.stdout)
            .with_listeners(listeners)
            .with_output_root(self.dir.path());
        execute(&mut self.runner, cell, &mut self.suite, options)
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.suite.variables.names().collect()
    }

    pub fn keyword_names(&self) -> Vec<&str> {
        self.suite.keywords.names().collect()
    }
}
