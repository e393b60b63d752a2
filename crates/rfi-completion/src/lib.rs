//! Context-aware completion for interactive sessions.
//!
//! [`complete`] looks at the text before the cursor, extracts the token being
//! typed (the *needle*) and completes, in order of precedence:
//!
//! 1. variables, when the needle starts with `$`, `@`, `&` or `%`;
//! 2. library names, on library-import lines in the settings section;
//! 3. keywords from a [`KeywordIndex`], when one is supplied.
//!
//! Completion never fails. Problems are logged and produce an empty reply.

mod context;
mod keywords;
mod libraries;
mod needle;
mod variables;

pub use context::{detect_context, line_at_cursor, CompletionContext};
pub use keywords::complete_keywords;
pub use libraries::{complete_libraries, is_library_line, library_needle, STANDARD_LIBRARIES};
pub use needle::{extract_needle, variable_tokens};
pub use variables::{complete_variables, BUILTIN_VARIABLES};

use rfi_core::char_to_byte_offset;
use rfi_index::KeywordIndex;
use rfi_suite::Suite;
use serde::{Deserialize, Serialize};

/// Default cap on keyword matches.
pub const DEFAULT_LIMIT: usize = 200;

/// What to complete, and against what.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub text: &'a str,
    /// Cursor in characters; `None` completes at the end of `text`.
    pub cursor: Option<usize>,
    pub suite: &'a Suite,
    pub index: Option<&'a KeywordIndex>,
    /// Library names offered besides the standard ones.
    pub extra_libraries: &'a [String],
    pub limit: usize,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(text: &'a str, suite: &'a Suite) -> Self {
        Self {
            text,
            cursor: None,
            suite,
            index: None,
            extra_libraries: &[],
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_index(mut self, index: Option<&'a KeywordIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_extra_libraries(mut self, extra: &'a [String]) -> Self {
        self.extra_libraries = extra;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Completion reply in the shape interactive front ends expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReply {
    pub matches: Vec<String>,
    /// Character offset where the replaced text starts.
    pub cursor_start: usize,
    /// Character offset where the replaced text ends.
    pub cursor_end: usize,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub status: String,
}

impl CompletionReply {
    pub fn empty(cursor: usize) -> Self {
        Self {
            matches: Vec::new(),
            cursor_start: cursor,
            cursor_end: cursor,
            metadata: serde_json::Map::new(),
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("cursor {cursor} is past the end of the text ({len} characters)")]
    CursorOutOfRange { cursor: usize, len: usize },
}

/// Complete at the request's cursor. Never fails: errors are logged at
/// `warn` and yield an empty reply.
pub fn complete(request: &CompletionRequest<'_>) -> CompletionReply {
    match try_complete(request) {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(target: "rfi.completion", error = %err, "completion failed");
            let len = request.text.chars().count();
            CompletionReply::empty(request.cursor.unwrap_or(len).min(len))
        }
    }
}

/// Like [`complete`], but reports problems instead of degrading.
pub fn try_complete(request: &CompletionRequest<'_>) -> Result<CompletionReply, CompletionError> {
    let text = request.text;
    let len = text.chars().count();
    let cursor = request.cursor.unwrap_or(len);
    if cursor > len {
        return Err(CompletionError::CursorOutOfRange { cursor, len });
    }

    let context = detect_context(text, Some(cursor));
    let (line, line_start) = line_at_cursor(text, Some(cursor));
    let line_cursor = char_to_byte_offset(line, cursor - line_start);
    let prefix = &line[..line_cursor];
    let mut needle = extract_needle(prefix).to_string();
    let mut cursor_end = cursor;

    let matches = if needle.starts_with(['$', '@', '&', '%']) {
        let text_cursor = char_to_byte_offset(text, cursor);
        let matches = complete_variables(&needle, request.suite, text, text_cursor);
        if line[line_cursor..].starts_with('}') {
            cursor_end += 1;
            needle.push('}');
        }
        matches
    } else if context == CompletionContext::Settings && is_library_line(line) {
        needle = library_needle(&needle);
        complete_libraries(&needle, request.extra_libraries)
    } else if let Some(index) = request.index {
        complete_keywords(&needle, index, context, line, request.limit)
    } else {
        Vec::new()
    };

    tracing::debug!(
        target: "rfi.completion",
        context = context.as_str(),
        needle = %needle,
        matches = matches.len(),
        "completed"
    );
    Ok(CompletionReply {
        matches,
        cursor_start: cursor_end.saturating_sub(needle.chars().count()),
        cursor_end,
        metadata: serde_json::Map::new(),
        status: "ok".to_string(),
    })
}
