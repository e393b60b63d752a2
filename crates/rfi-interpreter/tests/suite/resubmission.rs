use crate::suite::support::Session;

use pretty_assertions::assert_eq;
use rfi_runtime::Status;

const CELL: &str = "*** Test Cases ***\nCounts\n    Should Be Equal    1    1\n";

#[test]
fn resubmitting_a_cell_runs_its_test_once_each_time() {
    let mut session = Session::new();

    for _ in 0..3 {
        let result = session.run(CELL).unwrap();
        let names: Vec<&str> = result.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Counts"]);
        assert_eq!(result.statistics.total, 1);
        assert_eq!(result.status, Status::Pass);
        assert!(session.suite.tests.is_empty());
    }
}

#[test]
fn earlier_tests_are_not_rerun() {
    let mut session = Session::new();
    session
        .run("*** Test Cases ***\nFirst\n    No Operation\n")
        .unwrap();
    let result = session
        .run("*** Test Cases ***\nSecond\n    No Operation\n")
        .unwrap();

    let names: Vec<&str> = result.tests.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Second"]);
}

#[test]
fn declarations_persist_across_cells() {
    let mut session = Session::new();
    session
        .run(
            "*** Variables ***\n${GREETING}    Hello\n\n\
             *** Keywords ***\nGreet\n    [Arguments]    ${who}\n    RETURN    ${GREETING}, ${who}!\n",
        )
        .unwrap();

    let result = session
        .run(
            "*** Test Cases ***\nGreets\n    ${text}=    Greet    world\n    \
             Should Be Equal    ${text}    Hello, world!\n",
        )
        .unwrap();
    assert_eq!(result.status, Status::Pass);
    assert!(session.stdout.text().contains("| PASS |"));
}

#[test]
fn declaration_only_cells_produce_an_empty_result() {
    let mut session = Session::new();
    let result = session.run("*** Variables ***\n${X}    1\n").unwrap();
    assert!(result.tests.is_empty());
    assert_eq!(session.variable_names(), vec!["${X}"]);
    assert_eq!(session.suite.run_mode, None);
}
