use std::io::Write;

/// A text stream a runner writes console output or diagnostics to.
pub trait OutputSink {
    /// Append `text`; flush right away when `flush` is set.
    fn write(&mut self, text: &str, flush: bool);

    fn flush(&mut self);

    /// Failure text sealed by an earlier [`OutputSink::flush`], if this sink
    /// captures failures at all. Taking it leaves the sink empty.
    fn take_failure(&mut self) -> Option<String> {
        None
    }
}

/// Writes through to the process' standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write(&mut self, text: &str, flush: bool) {
        let mut out = std::io::stdout().lock();
        // Console output is best effort; a closed pipe must not abort a run.
        let _ = out.write_all(text.as_bytes());
        if flush {
            let _ = out.flush();
        }
    }

    fn flush(&mut self) {
        let _ = std::io::stdout().lock().flush();
    }
}

/// Collects everything written to it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferSink {
    text: String,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl OutputSink for BufferSink {
    fn write(&mut self, text: &str, _flush: bool) {
        self.text.push_str(text);
    }

    fn flush(&mut self) {}
}

/// Accumulates error text and turns it into a failure on flush.
///
/// Nothing is raised here: [`OutputSink::flush`] seals the buffered text and
/// [`OutputSink::take_failure`] hands it to whoever drives the run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorCapture {
    buffer: String,
    failure: Option<String>,
}

impl ErrorCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text written since the last flush.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn has_failure(&self) -> bool {
        self.failure.is_some()
    }
}

impl OutputSink for ErrorCapture {
    fn write(&mut self, text: &str, flush: bool) {
        self.buffer.push_str(text);
        if flush {
            OutputSink::flush(self);
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        match &mut self.failure {
            Some(failure) => failure.push_str(&text),
            None => self.failure = Some(text),
        }
    }

    fn take_failure(&mut self) -> Option<String> {
        self.failure.take()
    }
}
