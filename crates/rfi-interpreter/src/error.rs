use rfi_suite::{CompileError, MergeError, ModeConflict};

/// Diagnostics a run wrote to its error stream.
///
/// By the time a caller sees this the suite has already been rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    ModeConflict(#[from] ModeConflict),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("failed to create output directory: {0}")]
    Io(#[from] std::io::Error),
}

impl InterpreterError {
    /// Whether the suite was rolled back, as opposed to never touched.
    pub fn rolled_back(&self) -> bool {
        matches!(self, InterpreterError::Execution(_) | InterpreterError::Io(_))
    }
}

impl From<MergeError> for InterpreterError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::Compile(err) => InterpreterError::Compile(err),
            MergeError::ModeConflict(err) => InterpreterError::ModeConflict(err),
        }
    }
}
