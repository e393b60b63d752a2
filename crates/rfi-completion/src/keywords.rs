use crate::context::CompletionContext;
use rfi_index::KeywordIndex;
use std::collections::HashSet;

/// Settings whose value is a keyword call.
const FIXTURE_SETTINGS: [&str; 6] = [
    "suite setup",
    "suite teardown",
    "test setup",
    "test teardown",
    "task setup",
    "task teardown",
];

/// Whether keyword names make sense at this position.
fn wants_keywords(context: CompletionContext, line: &str) -> bool {
    match context {
        _ if context.is_body() => true,
        CompletionContext::Settings => {
            let line = line.trim_start().to_lowercase();
            FIXTURE_SETTINGS.iter().any(|setting| line.starts_with(setting))
        }
        _ => false,
    }
}

/// Keyword names from `index` matching `needle`, best first. Names defined
/// by several libraries or resources are listed once.
pub fn complete_keywords(
    needle: &str,
    index: &KeywordIndex,
    context: CompletionContext,
    line: &str,
    limit: usize,
) -> Vec<String> {
    if needle.is_empty() || !wants_keywords(context, line) {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    index
        .search(needle, limit)
        .into_iter()
        .filter(|hit| seen.insert(hit.doc.name.clone()))
        .map(|hit| hit.doc.name.clone())
        .collect()
}
