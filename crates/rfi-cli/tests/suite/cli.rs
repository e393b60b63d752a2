use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn rfi() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rfi"))
}

/// A workspace with logging kept off the captured streams.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("rfi.toml")
        .write_str("[logging]\nstderr = false\n")
        .unwrap();
    temp
}

#[test]
fn help_mentions_core_commands() {
    rfi().arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("repl"))
            .and(predicate::str::contains("complete")),
    );
}

#[test]
fn run_executes_cells_in_one_session() {
    let temp = workspace();
    temp.child("vars.robot")
        .write_str("*** Variables ***\n${NAME}    world\n")
        .unwrap();
    temp.child("test.robot")
        .write_str("*** Test Cases ***\nGreets\n    Should Be Equal    ${NAME}    world\n")
        .unwrap();

    rfi()
        .current_dir(temp.path())
        .args(["run", "vars.robot", "test.robot"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Greets")
                .and(predicate::str::contains("| PASS |"))
                .and(predicate::str::contains("1 test, 1 passed, 0 failed")),
        );
}

#[test]
fn run_stops_at_the_first_failing_cell() {
    let temp = workspace();
    temp.child("fail.robot")
        .write_str("*** Test Cases ***\nBroken\n    Should Be Equal    1    2\n")
        .unwrap();
    temp.child("never.robot")
        .write_str("*** Test Cases ***\nNever\n    No Operation\n")
        .unwrap();

    rfi()
        .current_dir(temp.path())
        .args(["run", "fail.robot", "never.robot"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "fail.robot: Test 'Broken' failed: 1 != 2",
        ))
        .stdout(predicate::str::contains("Never").not());
}

#[test]
fn run_json_prints_results() {
    let temp = workspace();
    temp.child("test.robot")
        .write_str("*** Test Cases ***\nA\n    No Operation\nB\n    No Operation\n")
        .unwrap();

    let output = rfi()
        .current_dir(temp.path())
        .args(["run", "--json", "test.robot"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["status"], "PASS");
    assert_eq!(results[0]["statistics"]["total"], 2);
    assert_eq!(results[0]["tests"][1]["name"], "B");
}

#[test]
fn repl_reads_cells_from_stdin_and_rolls_back_failures() {
    let temp = workspace();
    let input = "*** Variables ***\n${A}    1\n\
                 %%\n\
                 *** Variables ***\n${B}    2\n*** Test Cases ***\nBad\n    Fail    nope\n\
                 %%\n\
                 *** Test Cases ***\nUses B\n    Log    ${B}\n";

    rfi()
        .current_dir(temp.path())
        .arg("repl")
        .write_stdin(input)
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("cell 2: Test 'Bad' failed: nope")
                .and(predicate::str::contains("Variable '${B}' not found.")),
        );
}

#[test]
fn complete_uses_keywords_from_preludes() {
    let temp = workspace();
    temp.child("prelude.robot")
        .write_str("*** Keywords ***\nMy Custom Step\n    No Operation\n")
        .unwrap();
    temp.child("edit.robot")
        .write_str("*** Test Cases ***\nT\n    My Cus")
        .unwrap();

    rfi()
        .current_dir(temp.path())
        .args(["complete", "edit.robot", "--prelude", "prelude.robot"])
        .assert()
        .success()
        .stdout("My Custom Step\n");
}

#[test]
fn complete_json_reports_the_replaced_range() {
    let temp = workspace();
    temp.child("edit.robot")
        .write_str("*** Settings ***\nLibrary    Coll")
        .unwrap();

    let output = rfi()
        .current_dir(temp.path())
        .args(["complete", "edit.robot", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let reply: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        reply,
        serde_json::json!({
            "matches": ["Collections"],
            "cursor_start": 28,
            "cursor_end": 32,
            "metadata": {},
            "status": "ok"
        })
    );
}

#[test]
fn extra_libraries_come_from_config() {
    let temp = TempDir::new().unwrap();
    temp.child("rfi.toml")
        .write_str("[logging]\nstderr = false\n\n[completion]\nextra_libraries = [\"SeleniumLibrary\"]\n")
        .unwrap();
    temp.child("edit.robot")
        .write_str("*** Settings ***\nLibrary    Selen")
        .unwrap();

    rfi()
        .current_dir(temp.path())
        .args(["complete", "edit.robot"])
        .assert()
        .success()
        .stdout("SeleniumLibrary\n");
}

#[test]
fn invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    temp.child("rfi.toml")
        .write_str("[logging]\njson = \"yes\"\n")
        .unwrap();
    temp.child("edit.robot").write_str("").unwrap();

    rfi()
        .current_dir(temp.path())
        .args(["complete", "edit.robot"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse toml config"));
}
