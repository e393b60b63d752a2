//! Text offsets and line lookups.
//!
//! Parsers in this workspace work on UTF-8 byte offsets. Interactive front-ends
//! (notebook kernels) address the cursor in Unicode scalar values instead, so
//! conversions in both directions live here.

use text_size::TextSize;

/// Pre-computed line start offsets for a particular text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (idx, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::from((idx + 1) as u32));
            }
        }

        Self {
            line_starts,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }

    /// 0-based line containing `offset`. Offsets past the end clamp to the last line.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line as u32,
            Err(insert) => insert.saturating_sub(1) as u32,
        }
    }
}

/// Convert a cursor expressed in Unicode scalar values into a byte offset.
///
/// Cursors past the end of `text` clamp to `text.len()`.
pub fn char_to_byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Convert a byte offset into a count of Unicode scalar values.
///
/// Offsets inside a multi-byte character count that character.
pub fn byte_to_char_offset(text: &str, byte: usize) -> usize {
    let byte = byte.min(text.len());
    text.char_indices().take_while(|(idx, _)| *idx < byte).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_of_handles_boundaries() {
        let text = "a\nbc\n\nd";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_of(TextSize::from(0)), 0);
        assert_eq!(index.line_of(TextSize::from(1)), 0);
        assert_eq!(index.line_of(TextSize::from(2)), 1);
        assert_eq!(index.line_of(TextSize::from(5)), 2);
        assert_eq!(index.line_of(TextSize::from(6)), 3);
        assert_eq!(index.line_of(TextSize::from(100)), 3);
    }

    #[test]
    fn char_and_byte_offsets_round_trip_over_multibyte_text() {
        let text = "Log    ü${X}";
        assert_eq!(char_to_byte_offset(text, 7), 7);
        assert_eq!(char_to_byte_offset(text, 8), 9);
        assert_eq!(char_to_byte_offset(text, 1_000), text.len());
        assert_eq!(byte_to_char_offset(text, 9), 8);
        assert_eq!(byte_to_char_offset(text, 8), 8);
    }
}
