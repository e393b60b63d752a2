use crate::suite::support::Session;

use pretty_assertions::assert_eq;
use rfi_interpreter::InterpreterError;

#[test]
fn a_failing_test_rolls_back_the_whole_cell() {
    let mut session = Session::new();
    session.run("*** Variables ***\n${A}    1\n").unwrap();

    let err = session
        .run(
            "*** Variables ***\n${B}    2\n\n\
             *** Keywords ***\nHelper\n    No Operation\n\n\
             *** Test Cases ***\nBroken\n    Should Be Equal    ${A}    ${B}\n",
        )
        .unwrap_err();

    match &err {
        InterpreterError::Execution(err) => {
            assert_eq!(err.message, "Test 'Broken' failed: 1 != 2\n")
        }
        other => panic!("expected an execution error, got {other:?}"),
    }
    assert!(err.rolled_back());
    assert_eq!(session.variable_names(), vec!["${A}"]);
    assert!(session.keyword_names().is_empty());
    assert!(session.suite.tests.is_empty());
    assert_eq!(session.suite.run_mode, None);
}

#[test]
fn rolled_back_variables_are_gone_for_later_cells() {
    let mut session = Session::new();
    session
        .run("*** Variables ***\n${B}    2\n*** Test Cases ***\nT\n    Fail    no\n")
        .unwrap_err();

    let err = session
        .run("*** Test Cases ***\nUses B\n    Log    ${B}\n")
        .unwrap_err();
    let InterpreterError::Execution(err) = err else {
        panic!("expected an execution error");
    };
    assert!(err.message.contains("Variable '${B}' not found."), "{}", err.message);
}

#[test]
fn suite_settings_are_rolled_back() {
    let mut session = Session::new();
    session
        .run("*** Settings ***\nSuite Setup    Fail    broken\n*** Test Cases ***\nT\n    No Operation\n")
        .unwrap_err();
    assert_eq!(session.suite.settings.setup, None);

    session
        .run("*** Test Cases ***\nT\n    No Operation\n")
        .unwrap();
}

#[test]
fn compile_errors_leave_the_suite_untouched() {
    let mut session = Session::new();
    session.run("*** Variables ***\n${A}    1\n").unwrap();

    let err = session
        .run("*** Variables ***\n${B}    2\n*** Settings ***\nBogus    x\n")
        .unwrap_err();
    let InterpreterError::Compile(err) = &err else {
        panic!("expected a compile error, got {err:?}");
    };
    let expected = format!(
        "Error in file '{}' on line 4: Non-existing setting 'Bogus'.",
        session.dir.path().display()
    );
    assert_eq!(err.to_string(), expected);
    assert_eq!(session.variable_names(), vec!["${A}"]);
    assert!(session.stdout.text().is_empty());
}

#[test]
fn import_failures_roll_back() {
    let mut session = Session::new();
    let err = session
        .run("*** Settings ***\nLibrary    NoSuchLibrary\n")
        .unwrap_err();
    assert!(matches!(err, InterpreterError::Execution(_)));
    assert!(session.suite.imports.is_empty());

    session
        .run("*** Settings ***\nLibrary    Collections\n")
        .unwrap();
    let imports: Vec<&str> = session.suite.imports.names().collect();
    assert_eq!(imports, vec!["Collections"]);
}
