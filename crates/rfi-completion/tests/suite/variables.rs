use pretty_assertions::assert_eq;
use rfi_completion::{complete, CompletionRequest};
use rfi_suite::{merge, Suite, TestDefaults};

fn suite_with_host() -> Suite {
    let mut suite = Suite::new("Session", ".");
    merge(
        "*** Variables ***\n${HOST}    localhost\n",
        &mut suite,
        &mut TestDefaults::default(),
    )
    .unwrap();
    suite
}

#[test]
fn completes_suite_variables_from_the_sigil() {
    let suite = suite_with_host();
    let text = "*** Test Cases ***\nT\n    Log    ${HO";
    let reply = complete(&CompletionRequest::new(text, &suite));

    assert_eq!(reply.matches, vec!["${HOST}"]);
    let len = text.chars().count();
    assert_eq!(reply.cursor_end, len);
    assert_eq!(reply.cursor_start, len - "${HO".len());
    assert_eq!(text.chars().nth(reply.cursor_start), Some('$'));
}

#[test]
fn a_typed_closing_brace_is_consumed() {
    let suite = suite_with_host();
    let text = "*** Test Cases ***\nT\n    Log    ${HO}";
    let cursor = text.chars().count() - 1;
    let reply = complete(&CompletionRequest::new(text, &suite).with_cursor(Some(cursor)));

    assert_eq!(reply.matches, vec!["${HOST}"]);
    assert_eq!(reply.cursor_end, cursor + 1);
    assert_eq!(reply.cursor_start, cursor - "${HO".len());
}

#[test]
fn variables_assigned_in_the_snippet_are_candidates() {
    let suite = Suite::new("Session", ".");
    let text = "*** Test Cases ***\nT\n    ${answer}=    Set Variable    42\n    Log    ${ans";
    let reply = complete(&CompletionRequest::new(text, &suite));
    assert_eq!(reply.matches, vec!["${answer}"]);
}

#[test]
fn builtin_variables_complete_anywhere() {
    let suite = Suite::new("Session", ".");
    let reply = complete(&CompletionRequest::new("Log    ${TEST_NA", &suite));
    assert_eq!(reply.matches, vec!["${TEST_NAME}"]);

    let reply = complete(&CompletionRequest::new("    ${sp", &suite));
    assert_eq!(reply.matches, vec!["${SPACE}"]);
}
