//! [`BasicRunner`], a small interpreter for suites built by `rfi-suite`.

mod args;
mod eval;
mod executor;
mod failure;
mod library;
mod time;
mod value;
mod variables;

pub use time::parse_time;
pub use value::Value;

use crate::result::{Statistics, Status, SuiteResult, TestResult};
use crate::runner::{RunContext, SuiteRunner};
use executor::{elapsed_ms, Executor};
use failure::FailureKind;
use library::LibraryRegistry;
use rfi_suite::{RunMode, Suite, TestCase};
use std::time::Instant;

const DEFAULT_CONSOLE_WIDTH: usize = 78;

/// Runs suites with the standard libraries and writes a console report.
pub struct BasicRunner {
    registry: LibraryRegistry,
    console_width: usize,
}

impl BasicRunner {
    pub fn new() -> Self {
        Self {
            registry: LibraryRegistry::standard(),
            console_width: DEFAULT_CONSOLE_WIDTH,
        }
    }

    pub fn with_console_width(mut self, width: usize) -> Self {
        self.console_width = width.max(20);
        self
    }

    fn status_line(&self, name: &str, status: Status) -> String {
        let width = self.console_width.saturating_sub(8);
        let name = truncate(name, width);
        format!("{name:<width$}| {} |\n", status.as_str())
    }

    fn rule(&self, c: char) -> String {
        let mut line: String = std::iter::repeat(c).take(self.console_width).collect();
        line.push('\n');
        line
    }
}

impl Default for BasicRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteRunner for BasicRunner {
    fn run(&mut self, suite: &Suite, ctx: RunContext<'_, '_>) -> SuiteResult {
        let started = Instant::now();
        let mut ctx = ctx;
        let kind = match ctx.run_mode {
            Some(RunMode::Tasks) => "Task",
            _ => "Test",
        };
        ctx.start_suite(suite);

        let mut exec = Executor::new(suite, ctx.reborrow(), &self.registry);
        set_builtin_variables(&mut exec);
        let builtin = self.registry.builtin().name;
        if let Err(failure) = exec.import_library(builtin, &[], None) {
            exec.ctx.error(&failure.message);
        }
        exec.import_suite();
        exec.set_suite_variables();

        let has_tests = !suite.tests.is_empty();
        if has_tests {
            let header = format!(
                "{}{}\n{}",
                self.rule('='),
                truncate(&suite.name, self.console_width),
                self.rule('=')
            );
            exec.ctx.stdout.write(&header, false);
        }

        // Status and message given to every test when the suite setup did not pass.
        let mut setup_failure: Option<(Status, String)> = None;
        let mut message = String::new();
        if let Some(setup) = &suite.settings.setup {
            if let Err(failure) = exec.run_fixture(setup) {
                match failure.kind {
                    FailureKind::Pass => {}
                    FailureKind::Skip => setup_failure = Some((Status::Skip, failure.message)),
                    FailureKind::Fail | FailureKind::Fatal => {
                        message = format!("Suite setup failed:\n{}", failure.message);
                        setup_failure = Some((
                            Status::Fail,
                            format!("Parent suite setup failed:\n{}", failure.message),
                        ));
                    }
                }
            }
        }

        let mut tests = Vec::with_capacity(suite.tests.len());
        for test in suite.tests.iter() {
            exec.ctx.start_test(&test.name);
            let result = match &setup_failure {
                Some((status, message)) => not_run(test, *status, message),
                None if exec.fatal => not_run(
                    test,
                    Status::Fail,
                    "Test execution stopped due to a fatal error.",
                ),
                None => exec.run_test(test),
            };
            let mut report = self.status_line(&result.name, result.status);
            if !result.message.is_empty() {
                report.push_str(&result.message);
                report.push('\n');
            }
            report.push_str(&self.rule('-'));
            exec.ctx.stdout.write(&report, true);
            exec.ctx.end_test(&result);
            tests.push(result);
        }

        if let Some(teardown) = &suite.settings.teardown {
            if let Err(failure) = exec.run_fixture(teardown) {
                if failure.kind != FailureKind::Pass {
                    for test in tests.iter_mut().filter(|t| t.status != Status::Skip) {
                        if test.status == Status::Fail {
                            test.message = format!(
                                "{}\n\nAlso parent suite teardown failed:\n{}",
                                test.message, failure.message
                            );
                        } else {
                            test.status = Status::Fail;
                            test.message =
                                format!("Parent suite teardown failed:\n{}", failure.message);
                        }
                    }
                    message = if message.is_empty() {
                        format!("Suite teardown failed:\n{}", failure.message)
                    } else {
                        format!("{message}\n\nAlso suite teardown failed:\n{}", failure.message)
                    };
                }
            }
        }

        let statistics = Statistics::from_tests(&tests);
        let status = if statistics.failed > 0 || !message.is_empty() {
            Status::Fail
        } else if statistics.total > 0 && statistics.skipped == statistics.total {
            Status::Skip
        } else {
            Status::Pass
        };
        let result = SuiteResult {
            name: suite.name.clone(),
            source: suite.source.display().to_string(),
            status,
            message,
            tests,
            statistics,
            elapsed_ms: elapsed_ms(started),
        };

        let output = exec.ctx.output_dir.join(crate::OUTPUT_FILE);
        if has_tests {
            let mut footer = self.status_line(&suite.name, result.status);
            footer.push_str(&summary(kind, &result.statistics));
            footer.push('\n');
            footer.push_str(&self.rule('='));
            footer.push_str(&format!("Output:  {}\n", output.display()));
            exec.ctx.stdout.write(&footer, true);
        }

        for test in result.tests.iter().filter(|t| t.status == Status::Fail) {
            exec.ctx
                .error(&format!("{kind} '{}' failed: {}", test.name, test.message));
        }
        if result.tests.is_empty() && !result.message.is_empty() {
            exec.ctx
                .error(&format!("Suite '{}' failed: {}", result.name, result.message));
        }

        let written = serde_json::to_string_pretty(&result)
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(&output, json));
        if let Err(err) = written {
            exec.ctx.error(&format!(
                "Writing output file '{}' failed: {err}",
                output.display()
            ));
        }
        drop(exec);

        ctx.end_suite(&result);
        tracing::debug!(
            target: "rfi.runtime",
            suite = %result.name,
            status = result.status.as_str(),
            total = result.statistics.total,
            failed = result.statistics.failed,
            elapsed_ms = result.elapsed_ms,
            "suite finished"
        );
        result
    }
}

fn set_builtin_variables(exec: &mut Executor<'_, '_>) {
    let suite = exec.suite;
    let output_dir = exec.ctx.output_dir.to_path_buf();
    let path = |name: &str| Value::str(output_dir.join(name).display().to_string());
    let cwd = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let metadata = suite
        .settings
        .metadata
        .iter()
        .map(|(name, value)| (name.clone(), Value::str(value.as_str())))
        .collect();

    let builtins = [
        ("${TEMPDIR}", Value::str(std::env::temp_dir().display().to_string())),
        ("${EXECDIR}", Value::Str(cwd)),
        ("${/}", Value::str(std::path::MAIN_SEPARATOR.to_string())),
        ("${:}", Value::str(if cfg!(windows) { ";" } else { ":" })),
        ("${\n}", Value::str("\n")),
        ("${SPACE}", Value::str(" ")),
        ("${True}", Value::Bool(true)),
        ("${False}", Value::Bool(false)),
        ("${None}", Value::None),
        ("${null}", Value::None),
        ("${EMPTY}", Value::str("")),
        ("${OUTPUT_DIR}", Value::str(output_dir.display().to_string())),
        ("${OUTPUT_FILE}", path(crate::OUTPUT_FILE)),
        ("${LOG_FILE}", Value::str("NONE")),
        ("${REPORT_FILE}", Value::str("NONE")),
        ("${DEBUG_FILE}", Value::str("NONE")),
        ("${LOG_LEVEL}", Value::str("INFO")),
        ("${CURDIR}", Value::str(suite.source.display().to_string())),
        ("${SUITE_NAME}", Value::str(suite.name.as_str())),
        ("${SUITE_SOURCE}", Value::str(suite.source.display().to_string())),
        (
            "${SUITE_DOCUMENTATION}",
            Value::str(suite.settings.documentation.as_str()),
        ),
        ("&{SUITE_METADATA}", Value::dict(metadata)),
        ("${PREV_TEST_NAME}", Value::str("")),
        ("${PREV_TEST_STATUS}", Value::str("")),
        ("${PREV_TEST_MESSAGE}", Value::str("")),
    ];
    for (name, value) in builtins {
        exec.vars.set_builtin(name, value);
    }
}

fn not_run(test: &TestCase, status: Status, message: &str) -> TestResult {
    TestResult {
        name: test.name.clone(),
        status,
        message: message.to_string(),
        tags: test.tags.clone(),
        elapsed_ms: 0,
        messages: Vec::new(),
    }
}

fn summary(kind: &str, stats: &Statistics) -> String {
    let noun = if stats.total == 1 {
        kind.to_lowercase()
    } else {
        format!("{}s", kind.to_lowercase())
    };
    let mut line = format!(
        "{} {noun}, {} passed, {} failed",
        stats.total, stats.passed, stats.failed
    );
    if stats.skipped > 0 {
        line.push_str(&format!(", {} skipped", stats.skipped));
    }
    line
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{LibraryDoc, Listener};
    use crate::sink::{BufferSink, ErrorCapture, OutputSink};
    use pretty_assertions::assert_eq;
    use rfi_suite::{merge, TestDefaults};
    use std::path::Path;

    struct Run {
        result: SuiteResult,
        stdout: String,
        failure: Option<String>,
    }

    fn run_in(dir: &Path, cells: &[&str], listeners: &mut [&mut dyn Listener]) -> Run {
        let mut suite = Suite::new("Session", dir);
        let mut run_mode = None;
        for cell in cells {
            run_mode = merge(cell, &mut suite, &mut TestDefaults::default())
                .unwrap()
                .run_mode;
        }
        let output = tempfile::tempdir().unwrap();
        let mut stdout = BufferSink::new();
        let mut stderr = ErrorCapture::new();
        let result = BasicRunner::new().run(
            &suite,
            RunContext {
                output_dir: output.path(),
                run_mode,
                stdout: &mut stdout,
                stderr: &mut stderr,
                listeners,
            },
        );
        stderr.flush();
        assert!(output.path().join(crate::OUTPUT_FILE).is_file());
        Run {
            result,
            stdout: stdout.into_text(),
            failure: stderr.take_failure(),
        }
    }

    fn run(cell: &str) -> Run {
        let dir = tempfile::tempdir().unwrap();
        run_in(dir.path(), &[cell], &mut [])
    }

    #[test]
    fn passing_test_reports_on_stdout_only() {
        let run = run("*** Test Cases ***\nAdds up\n    ${sum}=    Evaluate Sum\n\n\
                       *** Keywords ***\nEvaluate Sum\n    ${x}=    Set Variable    ${2}\n    RETURN    ${x}\n");
        assert_eq!(run.failure, None);
        assert_eq!(run.result.status, Status::Pass);
        assert_eq!(run.result.statistics.passed, 1);
        assert!(run.stdout.contains("| PASS |"), "{}", run.stdout);
        assert!(run.stdout.contains("1 test, 1 passed, 0 failed"), "{}", run.stdout);
    }

    #[test]
    fn failing_test_is_written_to_stderr() {
        let run = run("*** Test Cases ***\nT\n    Should Be Equal    1    2\n");
        assert_eq!(run.result.status, Status::Fail);
        assert_eq!(run.result.test("T").unwrap().message, "1 != 2");
        assert_eq!(run.failure.as_deref(), Some("Test 'T' failed: 1 != 2\n"));
    }

    #[test]
    fn tasks_are_reported_as_tasks() {
        let run = run("*** Tasks ***\nJob\n    Fail    nope\n");
        assert_eq!(run.failure.as_deref(), Some("Task 'Job' failed: nope\n"));
        assert!(run.stdout.contains("1 task, 0 passed, 1 failed"));
    }

    #[test]
    fn user_keywords_bind_arguments_and_defaults() {
        let run = run("*** Keywords ***\nGreet\n    [Arguments]    ${who}    ${greeting}=Hello\n\
                       \x20   [Return]    ${greeting}, ${who}!\n\n\
                       *** Test Cases ***\nT\n    ${a}=    Greet    world\n\
                       \x20   Should Be Equal    ${a}    Hello, world!\n\
                       \x20   ${b}=    Greet    you    greeting=Hi\n\
                       \x20   Should Be Equal    ${b}    Hi, you!\n");
        assert_eq!(run.failure, None, "{}", run.stdout);
    }

    #[test]
    fn suite_setup_failure_fails_every_test() {
        let run = run("*** Settings ***\nSuite Setup    Fail    broken\n\n\
                       *** Test Cases ***\nA\n    No Operation\nB\n    No Operation\n");
        assert_eq!(run.result.statistics.failed, 2);
        assert_eq!(
            run.result.test("A").unwrap().message,
            "Parent suite setup failed:\nbroken"
        );
        assert_eq!(run.result.message, "Suite setup failed:\nbroken");
    }

    #[test]
    fn fatal_error_stops_remaining_tests() {
        let run = run("*** Test Cases ***\nA\n    Fatal Error    stop\nB\n    No Operation\n");
        assert_eq!(
            run.result.test("B").unwrap().message,
            "Test execution stopped due to a fatal error."
        );
    }

    #[test]
    fn suite_without_tests_runs_declarations_silently() {
        let run = run("*** Variables ***\n${X}    1\n");
        assert_eq!(run.failure, None);
        assert_eq!(run.stdout, "");
        assert_eq!(run.result.statistics.total, 0);
    }

    #[test]
    fn unknown_library_is_an_error_against_its_line() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_in(dir.path(), &["*** Settings ***\nLibrary    Nope\n"], &mut []);
        let failure = run.failure.unwrap();
        assert!(
            failure.contains("on line 2: Importing library 'Nope' failed"),
            "{failure}"
        );
    }

    #[test]
    fn resource_keywords_are_importable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("common.resource"),
            "*** Keywords ***\nDouble\n    [Arguments]    ${x}\n    RETURN    ${x}${x}\n",
        )
        .unwrap();
        let run = run_in(
            dir.path(),
            &["*** Settings ***\nResource    common.resource\n\n\
               *** Test Cases ***\nT\n    ${d}=    common.Double    ab\n\
               \x20   Should Be Equal    ${d}    abab\n"],
            &mut [],
        );
        assert_eq!(run.failure, None, "{}", run.stdout);
    }

    #[test]
    fn keyword_timeouts_end_with_the_keyword() {
        let run = run("*** Keywords ***\nQuick\n    [Timeout]    200ms\n    No Operation\n\
                       Slow\n    [Timeout]    50ms\n    Sleep    5s\n\n\
                       *** Test Cases ***\nReleases Deadline\n    Quick\n    Sleep    300ms\n\
                       Times Out\n    Slow\n");
        assert_eq!(run.result.test("Releases Deadline").unwrap().status, Status::Pass);
        let slow = run.result.test("Times Out").unwrap();
        assert_eq!(slow.status, Status::Fail);
        assert_eq!(slow.message, "Keyword timeout 50ms exceeded.");
    }

    #[test]
    fn standard_libraries_cover_common_steps() {
        let dir = tempfile::tempdir().unwrap();
        let cell = [
            "*** Settings ***",
            "Library    Collections",
            "Library    String",
            "Library    OperatingSystem",
            "",
            "*** Test Cases ***",
            "BuiltIn",
            "    ${x}=    Set Variable    a",
            "    Set Test Variable    ${t}    scoped",
            "    Set Suite Variable    ${s}    suite",
            "    Should Be Equal    ${t}    scoped",
            "    Should Not Be Equal    ${x}    b",
            "    @{items}=    Create List    a    b    c",
            "    ${n}=    Get Length    ${items}",
            "    Should Be Equal As Integers    ${n}    3",
            "    Should Be True    ${n} == 3",
            "    Should Contain    ${items}    b",
            "    ${joined}=    Catenate    SEPARATOR=-    a    b",
            "    Should Be Equal    ${joined}    a-b",
            "    ${i}=    Convert To Integer    ff    16",
            "    Should Be Equal As Integers    ${i}    255",
            "    ${r}=    Run Keyword If    ${n} == 2    Set Variable    no    ELSE    Set Variable    yes",
            "    Should Be Equal    ${r}    yes",
            "    ${status}    ${msg}=    Run Keyword And Ignore Error    Fail    boom",
            "    Should Be Equal    ${status}    FAIL",
            "    Should Be Equal    ${msg}    boom",
            "    Run Keyword And Expect Error    STARTS: bo    Fail    boom",
            "    Run Keyword    Log Many    done",
            "Suite Variable Survives",
            "    Should Be Equal As Strings    ${s}    suite",
            "Collections",
            "    @{l}=    Create List    b    a",
            "    Append To List    ${l}    c",
            "    Insert Into List    ${l}    0    z",
            "    Sort List    ${l}",
            "    ${first}=    Get From List    ${l}    0",
            "    Should Be Equal    ${first}    a",
            "    ${last}=    Remove From List    ${l}    -1",
            "    Should Be Equal    ${last}    z",
            "    List Should Contain Value    ${l}    c",
            "    &{d}=    Create Dictionary    a=1",
            "    Set To Dictionary    ${d}    b    2",
            "    ${value}=    Get From Dictionary    ${d}    b",
            "    Should Be Equal    ${value}    2",
            "    ${keys}=    Get Dictionary Keys    ${d}",
            "    Should Contain    ${keys}    b",
            "Strings",
            "    ${u}=    Convert To Upper Case    abc",
            "    Should Be Equal    ${u}    ABC",
            "    ${lower}=    Convert To Lower Case    ABC",
            "    Should Be Equal    ${lower}    abc",
            "    @{parts}=    Split String    a,b,c    ,",
            "    Should Contain    ${parts}    c",
            "    ${line}=    Get Line    only    0",
            "    Should Be Equal    ${line}    only",
            "    ${r}=    Replace String    hello world    world    there",
            "    Should Be Equal    ${r}    hello there",
            "    ${sub}=    Get Substring    hello    1    3",
            "    Should Be Equal    ${sub}    el",
            "    ${m}=    Get Regexp Matches    a1b22    [0-9]+",
            "    Should Contain    ${m}    22",
            "Files",
            "    Create File    out/f.txt    hello",
            "    File Should Exist    out/f.txt",
            "    ${c}=    Get File    out/f.txt",
            "    Should Be Equal    ${c}    hello",
            "    Create Directory    sub/deeper",
            "    Directory Should Exist    sub/deeper",
            "    Remove File    out/f.txt",
            "    Run Keyword And Expect Error    *does not exist*    File Should Exist    out/f.txt",
            "    ${p}=    Join Path    a    b",
            "    Should Contain    ${p}    b",
            "    ${v}=    Get Environment Variable    RFI_UNSET_FOR_TESTS    fallback",
            "    Should Be Equal    ${v}    fallback",
            "Passes Early",
            "    Pass Execution    done here",
            "    Fail    unreachable",
            "Skipped",
            "    Skip    not today",
            "",
        ]
        .join("\n");
        let run = run_in(dir.path(), &[cell.as_str()], &mut []);
        assert_eq!(run.failure, None, "{}", run.stdout);
        assert_eq!(run.result.statistics.passed, 6);
        assert_eq!(run.result.test("Passes Early").unwrap().message, "done here");
        let skipped = run.result.test("Skipped").unwrap();
        assert_eq!((skipped.status, skipped.message.as_str()), (Status::Skip, "not today"));
        assert!(!dir.path().join("out/f.txt").exists());
        assert!(dir.path().join("sub/deeper").is_dir());
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Listener for Recorder {
        fn start_suite(&mut self, suite: &Suite) {
            self.events.push(format!("start {}", suite.name));
        }

        fn end_test(&mut self, result: &TestResult) {
            self.events
                .push(format!("test {} {}", result.name, result.status.as_str()));
        }

        fn library_import(&mut self, library: &LibraryDoc) {
            self.events.push(format!("library {}", library.name));
        }

        fn end_suite(&mut self, result: &SuiteResult) {
            self.events.push(format!("end {}", result.status.as_str()));
        }
    }

    #[test]
    fn listeners_observe_imports_and_tests() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::default();
        run_in(
            dir.path(),
            &["*** Settings ***\nLibrary    Collections\n\n*** Test Cases ***\nT\n    No Operation\n"],
            &mut [&mut recorder],
        );
        assert_eq!(
            recorder.events,
            vec![
                "start Session",
                "library BuiltIn",
                "library Collections",
                "test T PASS",
                "end PASS",
            ]
        );
    }

    #[test]
    fn console_names_are_padded_and_truncated() {
        let runner = BasicRunner::new().with_console_width(30);
        assert_eq!(runner.status_line("Short", Status::Pass), format!("{:<22}| PASS |\n", "Short"));
        let long = runner.status_line(&"x".repeat(40), Status::Fail);
        assert!(long.starts_with(&format!("{}...", "x".repeat(19))));
    }
}
