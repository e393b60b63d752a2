use crate::suite::support::Session;

use pretty_assertions::assert_eq;
use rfi_interpreter::InterpreterError;
use rfi_suite::RunMode;

#[test]
fn mixing_tests_and_tasks_is_rejected() {
    let mut session = Session::new();
    let err = session
        .run(
            "*** Variables ***\n${X}    1\n\
             *** Test Cases ***\nT\n    No Operation\n\
             *** Tasks ***\nJob\n    No Operation\n",
        )
        .unwrap_err();

    assert!(matches!(err, InterpreterError::ModeConflict(_)));
    assert!(!err.rolled_back());
    assert_eq!(err.to_string(), "One file cannot have both tests and tasks.");
    assert!(session.variable_names().is_empty());
    assert!(session.suite.tests.is_empty());
    assert_eq!(session.suite.run_mode, None);
}

#[test]
fn a_single_kind_sets_the_mode() {
    let mut session = Session::new();
    session
        .run("*** Tasks ***\nJob\n    No Operation\n")
        .unwrap();
    assert_eq!(session.suite.run_mode, Some(RunMode::Tasks));
    assert!(session.stdout.text().contains("1 task, 1 passed, 0 failed"));

    session
        .run("*** Test Cases ***\nT\n    No Operation\n")
        .unwrap();
    assert_eq!(session.suite.run_mode, Some(RunMode::Tests));
}

#[test]
fn cells_without_tests_reset_the_mode() {
    let mut session = Session::new();
    session
        .run("*** Tasks ***\nJob\n    No Operation\n")
        .unwrap();
    assert_eq!(session.suite.run_mode, Some(RunMode::Tasks));
    session.run("*** Variables ***\n${X}    1\n").unwrap();
    assert_eq!(session.suite.run_mode, None);
}

#[test]
fn failed_cells_do_not_change_the_mode() {
    let mut session = Session::new();
    session
        .run("*** Tasks ***\nJob\n    Fail    nope\n")
        .unwrap_err();
    assert_eq!(session.suite.run_mode, None);
}
