use rfi_completion::{CompletionReply, CompletionRequest};
use rfi_config::RfiConfig;
use rfi_index::KeywordIndexer;
use rfi_interpreter::{execute, init_suite, ExecuteOptions, InterpreterError, Suite, SuiteResult};
use rfi_runtime::{BasicRunner, Listener, OutputSink};
use std::path::{Path, PathBuf};

/// One interpreter session: the suite, the reference runtime and a keyword
/// index fed by successful runs.
pub struct Session {
    suite: Suite,
    runner: BasicRunner,
    indexer: KeywordIndexer,
    extra_libraries: Vec<String>,
    limit: usize,
    output_root: Option<PathBuf>,
}

impl Session {
    pub fn new(config: &RfiConfig, root: &Path) -> Self {
        let source_dir = match &config.execution.source_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };
        Self {
            suite: init_suite(&config.execution.suite_name, Some(&source_dir)),
            runner: BasicRunner::new(),
            indexer: KeywordIndexer::new(),
            extra_libraries: config.completion.extra_libraries.clone(),
            limit: config.completion.limit,
            output_root: config.execution.output_root.clone(),
        }
    }

    /// Run one cell. Console output goes to `stdout`, or the process' standard
    /// output when `None`.
    pub fn execute(
        &mut self,
        cell: &str,
        stdout: Option<&mut dyn OutputSink>,
    ) -> Result<SuiteResult, InterpreterError> {
        let mut listeners: [&mut dyn Listener; 1] = [&mut self.indexer];
        let mut options = ExecuteOptions::default().with_listeners(&mut listeners);
        if let Some(stdout) = stdout {
            options = options.with_stdout(stdout);
        }
        if let Some(root) = &self.output_root {
            options = options.with_output_root(root);
        }
        execute(&mut self.runner, cell, &mut self.suite, options)
    }

    pub fn complete(&self, code: &str, cursor: Option<usize>) -> CompletionReply {
        let request = CompletionRequest::new(code, &self.suite)
            .with_cursor(cursor)
            .with_index(Some(self.indexer.index()))
            .with_extra_libraries(&self.extra_libraries)
            .with_limit(self.limit);
        rfi_completion::complete(&request)
    }
}

/// Split REPL input into cells on lines holding only `%%`.
pub fn split_cells(input: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    for line in input.split_inclusive('\n') {
        if line.trim() == "%%" {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
        }
    }
    cells.push(current);
    cells.retain(|cell| !cell.trim().is_empty());
    cells
}
