use pretty_assertions::assert_eq;
use rfi_completion::{complete, CompletionRequest};
use rfi_index::{DocKind, KeywordDoc, KeywordIndex};
use rfi_suite::Suite;

fn doc(source: &str, name: &str) -> KeywordDoc {
    KeywordDoc {
        name: name.to_string(),
        source: source.to_string(),
        kind: DocKind::Library,
        args: Vec::new(),
        doc: String::new(),
        tags: Vec::new(),
    }
}

fn index() -> KeywordIndex {
    KeywordIndex::build([
        doc("BuiltIn", "Log"),
        doc("BuiltIn", "Log Many"),
        doc("BuiltIn", "Should Be Equal"),
        doc("Session", "My Custom Step"),
    ])
}

#[test]
fn completes_keywords_in_test_bodies() {
    let suite = Suite::new("Session", ".");
    let index = index();
    let text = "*** Test Cases ***\nT\n    My Cus";
    let reply = complete(&CompletionRequest::new(text, &suite).with_index(Some(&index)));
    assert_eq!(reply.matches, vec!["My Custom Step"]);
    assert_eq!(reply.cursor_end - reply.cursor_start, "My Cus".len());
}

#[test]
fn keyword_needles_keep_single_spaces() {
    let suite = Suite::new("Session", ".");
    let index = index();
    let text = "*** Keywords ***\nStep\n    Should Be";
    let reply = complete(&CompletionRequest::new(text, &suite).with_index(Some(&index)));
    assert_eq!(reply.matches, vec!["Should Be Equal"]);
}

#[test]
fn fixture_settings_complete_keywords() {
    let suite = Suite::new("Session", ".");
    let index = index();
    let text = "*** Settings ***\nSuite Setup    Log M";
    let reply = complete(&CompletionRequest::new(text, &suite).with_index(Some(&index)));
    assert_eq!(reply.matches, vec!["Log Many"]);
}

#[test]
fn test_names_do_not_complete_keywords() {
    let suite = Suite::new("Session", ".");
    let index = index();
    let text = "*** Test Cases ***\nMy Cus";
    let reply = complete(&CompletionRequest::new(text, &suite).with_index(Some(&index)));
    assert!(reply.matches.is_empty());
}

#[test]
fn the_limit_caps_keyword_matches() {
    let suite = Suite::new("Session", ".");
    let index = index();
    let text = "*** Test Cases ***\nT\n    Lo";
    let request = CompletionRequest::new(text, &suite)
        .with_index(Some(&index))
        .with_limit(1);
    assert_eq!(complete(&request).matches, vec!["Log"]);
}
