use pretty_assertions::assert_eq;
use rfi_completion::{complete, try_complete, CompletionError, CompletionReply, CompletionRequest};
use rfi_suite::Suite;

#[test]
fn no_needle_and_no_index_is_an_empty_ok_reply() {
    let suite = Suite::new("Session", ".");
    let text = "*** Test Cases ***\nT\n    ";
    let reply = complete(&CompletionRequest::new(text, &suite));
    let len = text.chars().count();
    assert_eq!(reply, CompletionReply::empty(len));
    assert_eq!(reply.status, "ok");
}

#[test]
fn replies_serialize_with_snake_case_fields() {
    let suite = Suite::new("Session", ".");
    let reply = complete(&CompletionRequest::new("", &suite));
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        serde_json::json!({
            "matches": [],
            "cursor_start": 0,
            "cursor_end": 0,
            "metadata": {},
            "status": "ok"
        })
    );
}

#[test]
fn cursor_past_the_end_degrades_to_an_empty_reply() {
    let suite = Suite::new("Session", ".");
    let request = CompletionRequest::new("Log    ${X", &suite).with_cursor(Some(99));
    assert_eq!(
        try_complete(&request),
        Err(CompletionError::CursorOutOfRange { cursor: 99, len: 10 })
    );
    assert_eq!(complete(&request), CompletionReply::empty(10));
}

#[test]
fn cursors_count_characters() {
    let suite = Suite::new("Session", ".");
    let text = "*** Variables ***\n${größe}    1\n*** Test Cases ***\nT\n    Log    ${grö";
    let reply = complete(&CompletionRequest::new(text, &suite));
    assert_eq!(reply.matches, vec!["${größe}"]);
    assert_eq!(reply.cursor_end, text.chars().count());
    assert_eq!(reply.cursor_start, reply.cursor_end - 5);
}
