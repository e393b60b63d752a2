use crate::needle::variable_tokens_around;
use rfi_fuzzy::{contains_ignore_case, rank};
use rfi_suite::Suite;
use std::collections::BTreeSet;

/// Variables every run defines.
pub const BUILTIN_VARIABLES: &[&str] = &[
    "${TEMPDIR}",
    "${EXECDIR}",
    "${/}",
    "${:}",
    "${\\n}",
    "${SPACE}",
    "${True}",
    "${False}",
    "${None}",
    "${null}",
    "${OUTPUT_DIR}",
    "${OUTPUT_FILE}",
    "${REPORT_FILE}",
    "${LOG_FILE}",
    "${DEBUG_FILE}",
    "${LOG_LEVEL}",
    "${PREV_TEST_NAME}",
    "${PREV_TEST_STATUS}",
    "${PREV_TEST_MESSAGE}",
    "${CURDIR}",
    "${TEST_NAME}",
    "@{TEST_TAGS}",
    "${TEST_DOCUMENTATION}",
    "${TEST_STATUS}",
    "${TEST_MESSAGE}",
    "${SUITE_NAME}",
    "${SUITE_SOURCE}",
    "${SUITE_DOCUMENTATION}",
    "&{SUITE_METADATA}",
    "${SUITE_STATUS}",
    "${SUITE_MESSAGE}",
    "${KEYWORD_STATUS}",
    "${KEYWORD_MESSAGE}",
    "${EMPTY}",
    "@{EMPTY}",
    "&{EMPTY}",
];

/// Rank the suite's variables, references in `text` and the built-ins
/// against `needle`. Only candidates containing the needle are kept.
///
/// `cursor` is a byte offset into `text`; a reference spanning it is the one
/// being edited and is not offered back.
pub fn complete_variables(needle: &str, suite: &Suite, text: &str, cursor: usize) -> Vec<String> {
    let pool: BTreeSet<&str> = suite
        .variables
        .names()
        .chain(variable_tokens_around(text, cursor))
        .chain(BUILTIN_VARIABLES.iter().copied())
        .collect();
    rank(needle, pool)
        .into_iter()
        .filter(|ranked| contains_ignore_case(ranked.candidate, needle))
        .map(|ranked| ranked.candidate.to_string())
        .collect()
}
