use rfi_core::char_to_byte_offset;

/// Syntactic region the cursor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionContext {
    /// Before the first section header, or on the name line of a test,
    /// task or keyword.
    Root,
    Settings,
    Variables,
    TestBody,
    TaskBody,
    KeywordBody,
    Comments,
}

impl CompletionContext {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionContext::Root => "__root__",
            CompletionContext::Settings => "__settings__",
            CompletionContext::Variables => "__variables__",
            CompletionContext::TestBody => "__tests__",
            CompletionContext::TaskBody => "__tasks__",
            CompletionContext::KeywordBody => "__keywords__",
            CompletionContext::Comments => "__comments__",
        }
    }

    /// Contexts where a statement starts with a keyword call.
    pub fn is_body(self) -> bool {
        matches!(
            self,
            CompletionContext::TestBody | CompletionContext::TaskBody | CompletionContext::KeywordBody
        )
    }
}

enum Header {
    Settings,
    Variables,
    Tests,
    Tasks,
    Keywords,
    Comments,
    Unknown,
}

fn header(line: &str) -> Option<Header> {
    let line = line.strip_prefix("| ").unwrap_or(line);
    if !line.starts_with('*') {
        return None;
    }
    let name = line
        .split(|c: char| c == '\t' || c == '|')
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| c == '*' || c.is_whitespace())
        .to_lowercase();
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(match name.as_str() {
        "settings" | "setting" => Header::Settings,
        "variables" | "variable" => Header::Variables,
        "test cases" | "test case" => Header::Tests,
        "tasks" | "task" => Header::Tasks,
        "keywords" | "keyword" => Header::Keywords,
        "comments" | "comment" => Header::Comments,
        _ => Header::Unknown,
    })
}

/// Classify the cursor position by scanning backwards for the nearest
/// section header. `cursor` counts characters; `None` means end of text.
pub fn detect_context(text: &str, cursor: Option<usize>) -> CompletionContext {
    let end = cursor.map_or(text.len(), |cursor| char_to_byte_offset(text, cursor));
    let before = &text[..end];
    let current = before.rsplit('\n').next().unwrap_or_default();
    let indented = match current.strip_prefix('|') {
        // Pipe rows are indented when their first cell is empty: `|    | Log`.
        Some(rest) => rest.trim_start_matches([' ', '\t']).starts_with('|'),
        None => current.starts_with([' ', '\t']),
    };

    // The header scan starts at the current line so a half-typed header is
    // classified as the section it is about to open.
    let found = before.rsplit('\n').find_map(header);
    match found {
        None | Some(Header::Unknown) => CompletionContext::Root,
        Some(Header::Settings) => CompletionContext::Settings,
        Some(Header::Variables) => CompletionContext::Variables,
        Some(Header::Comments) => CompletionContext::Comments,
        Some(_) if !indented => CompletionContext::Root,
        Some(Header::Tests) => CompletionContext::TestBody,
        Some(Header::Tasks) => CompletionContext::TaskBody,
        Some(Header::Keywords) => CompletionContext::KeywordBody,
    }
}

/// The line containing `cursor` and the character offset it starts at.
pub fn line_at_cursor(text: &str, cursor: Option<usize>) -> (&str, usize) {
    let end = cursor.map_or(text.len(), |cursor| char_to_byte_offset(text, cursor));
    let start = text[..end].rfind('\n').map_or(0, |ix| ix + 1);
    let stop = text[end..].find('\n').map_or(text.len(), |ix| end + ix);
    let line = text[start..stop].strip_suffix('\r').unwrap_or(&text[start..stop]);
    (line, text[..start].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sections_map_to_contexts() {
        let text = "*** Settings ***\nLibrary    Coll";
        assert_eq!(detect_context(text, None), CompletionContext::Settings);

        let text = "*** Variables ***\n${X}    1\n";
        assert_eq!(detect_context(text, None), CompletionContext::Variables);

        let text = "*** Test Cases ***\nT\n    Lo";
        assert_eq!(detect_context(text, None), CompletionContext::TestBody);

        let text = "*** Tasks ***\nJob\n    Lo";
        assert_eq!(detect_context(text, None).as_str(), "__tasks__");

        let text = "*** Keywords ***\nStep\n    Lo";
        assert_eq!(detect_context(text, None).as_str(), "__keywords__");

        let text = "*** Comments ***\n    anything";
        assert_eq!(detect_context(text, None), CompletionContext::Comments);
    }

    #[test]
    fn name_lines_and_text_before_sections_are_root() {
        assert_eq!(detect_context("Log    x", None), CompletionContext::Root);
        let text = "*** Test Cases ***\nMy Te";
        assert_eq!(detect_context(text, None), CompletionContext::Root);
        let text = "*** Unknown ***\n    Lo";
        assert_eq!(detect_context(text, None), CompletionContext::Root);
    }

    #[test]
    fn cursor_limits_the_scan() {
        let text = "*** Settings ***\nLibrary    X\n*** Test Cases ***\nT\n    Log";
        assert_eq!(detect_context(text, Some(20)), CompletionContext::Settings);
        assert_eq!(detect_context(text, None), CompletionContext::TestBody);
    }

    #[test]
    fn headers_are_case_and_space_insensitive() {
        let text = "***test case***\nT\n\tLo";
        assert_eq!(detect_context(text, None), CompletionContext::TestBody);
        let text = "| *** Keyword *** |\n| Step |\n|    | Lo";
        assert_eq!(detect_context(text, None), CompletionContext::KeywordBody);
        let text = "| *** Keyword *** |\n| Ste";
        assert_eq!(detect_context(text, None), CompletionContext::Root);
    }

    #[test]
    fn lines_are_cut_at_newlines_in_characters() {
        let text = "ä\nfirst\nsecond";
        assert_eq!(line_at_cursor(text, Some(4)), ("first", 2));
        assert_eq!(line_at_cursor(text, None), ("second", 8));
        assert_eq!(line_at_cursor("", None), ("", 0));
        assert_eq!(line_at_cursor("a\r\nb", Some(1)), ("a", 0));
    }
}
