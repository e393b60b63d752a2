use crate::suite::support::Session;

use pretty_assertions::assert_eq;
use rfi_runtime::Status;

#[test]
fn redefined_variables_keep_the_latest_value() {
    let mut session = Session::new();
    session
        .run("*** Variables ***\n${X}    1\n${Y}    y\n${X}    2\n")
        .unwrap();
    assert_eq!(session.variable_names(), vec!["${X}", "${Y}"]);

    session.run("*** Variables ***\n${X}    3\n").unwrap();
    assert_eq!(session.variable_names(), vec!["${X}", "${Y}"]);
    let x = session.suite.variables.get("${X}").unwrap();
    assert_eq!(x.values, vec!["3"]);

    let result = session
        .run("*** Test Cases ***\nT\n    Should Be Equal    ${X}    3\n")
        .unwrap();
    assert_eq!(result.status, Status::Pass);
}

#[test]
fn redefined_keywords_use_the_latest_body() {
    let mut session = Session::new();
    session
        .run("*** Keywords ***\nAnswer\n    RETURN    1\n")
        .unwrap();
    session
        .run("*** Keywords ***\nAnswer\n    RETURN    2\n")
        .unwrap();
    assert_eq!(session.keyword_names(), vec!["Answer"]);

    let result = session
        .run(
            "*** Test Cases ***\nT\n    ${value}=    Answer\n    \
             Should Be Equal    ${value}    2\n",
        )
        .unwrap();
    assert_eq!(result.status, Status::Pass);
}

#[test]
fn tests_with_the_same_name_run_once() {
    let mut session = Session::new();
    let result = session
        .run(
            "*** Test Cases ***\nT\n    Fail    first definition\n\
             T\n    No Operation\n",
        )
        .unwrap();
    assert_eq!(result.tests.len(), 1);
    assert_eq!(result.tests[0].status, Status::Pass);
}
