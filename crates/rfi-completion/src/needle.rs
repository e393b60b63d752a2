use regex::Regex;
use std::sync::OnceLock;

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}|\t| \| ").expect("separator regex should compile"))
}

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[$@&%]\{[^{}\n]+\}").expect("variable regex should compile"))
}

/// The token being completed: whatever follows the last cell separator
/// (two or more whitespace characters, a tab, or ` | `), left-trimmed.
pub fn extract_needle(line_prefix: &str) -> &str {
    separator_regex()
        .split(line_prefix)
        .last()
        .unwrap_or_default()
        .trim_start()
}

/// Variable references such as `${HOST}` or `@{ITEMS}` anywhere in `text`.
pub fn variable_tokens(text: &str) -> impl Iterator<Item = &str> {
    variable_regex().find_iter(text).map(|m| m.as_str())
}

/// Like [`variable_tokens`], minus the reference the byte offset `cursor`
/// sits inside of: that one is still being typed.
pub(crate) fn variable_tokens_around(text: &str, cursor: usize) -> impl Iterator<Item = &str> {
    variable_regex()
        .find_iter(text)
        .filter(move |m| !(m.start() < cursor && cursor < m.end()))
        .map(|m| m.as_str())
}
