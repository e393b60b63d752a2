#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    /// Regular keyword failure.
    Fail,
    /// `Skip` and friends: the test is marked skipped.
    Skip,
    /// `Pass Execution`: the test stops and passes.
    Pass,
    /// `Fatal Error`: every remaining test fails.
    Fatal,
}

/// Why a keyword stopped early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub(crate) struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fail,
            message: message.into(),
        }
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Skip,
            message: message.into(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Pass,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    /// Failures `Run Keyword And Ignore Error` and friends may swallow.
    pub fn is_recoverable(&self) -> bool {
        self.kind == FailureKind::Fail
    }
}

pub(crate) type KwResult<T = super::value::Value> = Result<T, Failure>;
