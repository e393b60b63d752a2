use pretty_assertions::assert_eq;
use rfi_completion::{complete, CompletionRequest};
use rfi_suite::Suite;

#[test]
fn completes_library_names_in_settings() {
    let suite = Suite::new("Session", ".");
    for text in [
        "*** Settings ***\nLibrary    Coll",
        "*** Settings ***\nLibrary    coll",
        "*** Settings ***\nLIBRARY    COLL",
    ] {
        let reply = complete(&CompletionRequest::new(text, &suite));
        assert_eq!(reply.matches, vec!["Collections"], "{text}");
        assert_eq!(reply.cursor_start, reply.cursor_end - 4);
    }
}

#[test]
fn single_space_phrases_are_stripped_from_the_needle() {
    let suite = Suite::new("Session", ".");
    let text = "*** Settings ***\nLibrary Coll";
    let reply = complete(&CompletionRequest::new(text, &suite));
    assert_eq!(reply.matches, vec!["Collections"]);
    assert_eq!(reply.cursor_end - reply.cursor_start, "coll".len());
}

#[test]
fn extra_libraries_are_offered() {
    let suite = Suite::new("Session", ".");
    let extra = vec!["SeleniumLibrary".to_string()];
    let text = "*** Settings ***\nSuite Setup    Import Library    Sele";
    let reply = complete(&CompletionRequest::new(text, &suite).with_extra_libraries(&extra));
    assert_eq!(reply.matches, vec!["SeleniumLibrary"]);
}

#[test]
fn library_lines_outside_settings_do_not_complete_libraries() {
    let suite = Suite::new("Session", ".");
    let text = "*** Test Cases ***\nT\n    Import Library    Coll";
    let reply = complete(&CompletionRequest::new(text, &suite));
    assert!(reply.matches.is_empty());
}
