//! Splitting raw text into cells and logical statements.

use regex::Regex;
use rfi_core::{TextRange, TextSize};
use std::sync::OnceLock;

/// Separator between cells in the space separated format: two or more
/// whitespace characters, a tab, or a pipe surrounded by spaces.
pub const SEPARATOR_PATTERN: &str = r"\s{2,}|\t| \| ";

pub(crate) fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SEPARATOR_PATTERN).expect("separator regex should compile"))
}

/// One physical line split into cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLine {
    /// 1-based line number.
    pub line: u32,
    pub range: TextRange,
    pub text: String,
    /// Data cells, comments removed. Indented lines start with an empty cell.
    pub cells: Vec<String>,
}

impl RawLine {
    pub fn is_indented(&self) -> bool {
        self.cells.first().is_some_and(|c| c.is_empty())
    }

    /// Cells without the leading indentation marker.
    pub fn data(&self) -> &[String] {
        if self.is_indented() {
            &self.cells[1..]
        } else {
            &self.cells
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn is_continuation(&self) -> bool {
        self.data().first().is_some_and(|c| c == "...")
    }

    /// `*** Name ***` headers; the returned name is lower-cased and trimmed.
    pub fn header_name(&self) -> Option<String> {
        let rest = self.text.strip_prefix('*')?.trim_start_matches('*');
        let name = rest.split('*').next().unwrap_or_default();
        Some(name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
    }
}

pub(crate) fn split_lines(text: &str) -> Vec<RawLine> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    for (idx, physical) in text.split('\n').enumerate() {
        let start = offset;
        offset += physical.len() + 1;
        let content = physical.strip_suffix('\r').unwrap_or(physical);
        out.push(RawLine {
            line: (idx + 1) as u32,
            range: TextRange::new(
                TextSize::from(start as u32),
                TextSize::from((start + content.len()) as u32),
            ),
            text: content.to_string(),
            cells: split_cells(content),
        });
    }
    out
}

/// Split one line into cells.
///
/// Lines starting with `|` use the pipe separated format. Everything from the
/// first cell starting with `#` on is a comment and dropped, as are trailing
/// empty cells.
pub fn split_cells(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = if line.starts_with('|') {
        let inner = line.trim_start_matches('|').trim_end();
        let inner = inner.strip_suffix(" |").unwrap_or(inner);
        // `|    | Log | x |`: the empty first cell marks an indented line.
        inner.split(" | ").map(|c| c.trim().to_string()).collect()
    } else {
        let indented = line.starts_with([' ', '\t']);
        let mut cells: Vec<String> = separator_regex()
            .split(line.trim())
            .map(|c| c.trim().to_string())
            .collect();
        if indented {
            cells.insert(0, String::new());
        }
        cells
    };

    if let Some(comment) = cells.iter().position(|c| c.starts_with('#')) {
        cells.truncate(comment);
    }
    for cell in &mut cells {
        // A lone backslash is the explicit empty-cell marker.
        if cell == "\\" {
            cell.clear();
        }
    }
    while cells.len() > 1 && cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    if cells.len() == 1 && cells[0].is_empty() {
        cells.clear();
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(line: &str) -> Vec<String> {
        split_cells(line)
    }

    #[test]
    fn splits_on_two_spaces_tabs_and_pipes() {
        assert_eq!(cells("Log    hello world"), vec!["Log", "hello world"]);
        assert_eq!(cells("Log\thello"), vec!["Log", "hello"]);
        assert_eq!(cells("Log | hello"), vec!["Log", "hello"]);
        assert_eq!(cells("    Log  x"), vec!["", "Log", "x"]);
    }

    #[test]
    fn pipe_format_lines() {
        assert_eq!(cells("| My Test | Log | x |"), vec!["My Test", "Log", "x"]);
        assert_eq!(cells("|    | Log | x |"), vec!["", "Log", "x"]);
    }

    #[test]
    fn drops_comments_and_trailing_empty_cells() {
        assert_eq!(cells("    Log    x    # note"), vec!["", "Log", "x"]);
        assert_eq!(cells("# whole line"), Vec::<String>::new());
        assert_eq!(cells("   "), Vec::<String>::new());
        assert_eq!(cells("Log    \\    x"), vec!["Log", "", "x"]);
    }

    #[test]
    fn header_names_are_normalized() {
        let lines = split_lines("***Test  Cases***\n*** Settings ***    extra");
        assert_eq!(lines[0].header_name().as_deref(), Some("test cases"));
        assert_eq!(lines[1].header_name().as_deref(), Some("settings"));
    }
}
