use crate::suite::support::Session;

use pretty_assertions::assert_eq;
use rfi_index::KeywordIndexer;
use rfi_interpreter::complete;

const CUSTOM: &str = "*** Keywords ***\nMy Custom Step\n    No Operation\n";

#[test]
fn keywords_from_a_successful_run_complete() {
    let mut session = Session::new();
    let mut indexer = KeywordIndexer::new();
    session.run_with(CUSTOM, &mut [&mut indexer]).unwrap();

    let code = "*** Test Cases ***\nT\n    My Cus";
    let reply = complete(code, None, &session.suite, Some(&indexer), &[]);
    assert_eq!(reply.matches, vec!["My Custom Step"]);
    assert_eq!(reply.cursor_end, code.chars().count());
    assert_eq!(reply.cursor_start, reply.cursor_end - "My Cus".len());

    let reply = complete(
        "*** Test Cases ***\nT\n    Should Be Equal As Int",
        None,
        &session.suite,
        Some(&indexer),
        &[],
    );
    assert_eq!(reply.matches, vec!["Should Be Equal As Integers"]);
}

#[test]
fn keywords_from_a_failed_run_are_not_indexed() {
    let mut session = Session::new();
    let mut indexer = KeywordIndexer::new();
    session
        .run_with(
            "*** Keywords ***\nGhost Step\n    No Operation\n\
             *** Test Cases ***\nT\n    Fail    nope\n",
            &mut [&mut indexer],
        )
        .unwrap_err();

    let reply = complete(
        "*** Test Cases ***\nT\n    Ghost",
        None,
        &session.suite,
        Some(&indexer),
        &[],
    );
    assert!(reply.matches.is_empty());
    assert!(indexer.keywords().iter().all(|doc| doc.name != "Ghost Step"));
}

#[test]
fn suite_variables_complete_after_a_run() {
    let mut session = Session::new();
    session
        .run("*** Variables ***\n${SERVER_URL}    http://localhost\n")
        .unwrap();

    let reply = complete("Log    ${serv", None, &session.suite, None, &[]);
    assert_eq!(reply.matches, vec!["${SERVER_URL}"]);
}

#[test]
fn imported_library_keywords_complete() {
    let mut session = Session::new();
    let mut indexer = KeywordIndexer::new();
    session
        .run_with(
            "*** Settings ***\nLibrary    Collections\n",
            &mut [&mut indexer],
        )
        .unwrap();

    let reply = complete(
        "*** Test Cases ***\nT\n    Sort Li",
        None,
        &session.suite,
        Some(&indexer),
        &[],
    );
    assert_eq!(reply.matches, vec!["Sort List"]);
}
