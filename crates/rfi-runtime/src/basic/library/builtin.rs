use super::{assertion, compile_regex, failure, glob_matches, Args, Library, LibraryKeyword};
use crate::basic::eval::evaluate_condition;
use crate::basic::executor::Executor;
use crate::basic::failure::{Failure, KwResult};
use crate::basic::time::parse_time;
use crate::basic::value::Value;
use crate::basic::variables::split_decorated;
use std::time::Duration;

pub(super) static LIBRARY: Library = Library {
    name: "BuiltIn",
    doc: "Generic keywords that are always available.",
    keywords: KEYWORDS,
};

static KEYWORDS: &[LibraryKeyword] = &[
    LibraryKeyword::new(
        "Log",
        &["message", "level=INFO", "html=False", "console=False"],
        "Logs the given message with the given level.",
        log,
    ),
    LibraryKeyword::new(
        "Log Many",
        &["*messages"],
        "Logs the given messages as separate entries.",
        log_many,
    ),
    LibraryKeyword::new(
        "Comment",
        &["*messages"],
        "Displays the given messages in the log file.",
        no_operation,
    ),
    LibraryKeyword::new("No Operation", &[], "Does absolutely nothing.", no_operation),
    LibraryKeyword::new(
        "Set Log Level",
        &["level"],
        "Sets the log threshold and returns the old one.",
        set_log_level,
    ),
    LibraryKeyword::new(
        "Set Variable",
        &["*values"],
        "Returns the given values, which can then be assigned to variables.",
        set_variable,
    ),
    LibraryKeyword::new(
        "Set Test Variable",
        &["name", "*values"],
        "Makes a variable available everywhere within the scope of the current test.",
        set_test_variable,
    )
    .raw(1),
    LibraryKeyword::new(
        "Set Suite Variable",
        &["name", "*values"],
        "Makes a variable available everywhere within the scope of the current suite.",
        set_suite_variable,
    )
    .raw(1),
    LibraryKeyword::new(
        "Should Be Equal",
        &["first", "second", "msg=None", "values=True", "ignore_case=False"],
        "Fails if the given objects are unequal.",
        should_be_equal,
    ),
    LibraryKeyword::new(
        "Should Not Be Equal",
        &["first", "second", "msg=None", "values=True", "ignore_case=False"],
        "Fails if the given objects are equal.",
        should_not_be_equal,
    ),
    LibraryKeyword::new(
        "Should Be Equal As Integers",
        &["first", "second", "msg=None", "values=True"],
        "Fails if objects are unequal after converting them to integers.",
        should_be_equal_as_integers,
    ),
    LibraryKeyword::new(
        "Should Be Equal As Strings",
        &["first", "second", "msg=None", "values=True", "ignore_case=False"],
        "Fails if objects are unequal after converting them to strings.",
        should_be_equal_as_strings,
    ),
    LibraryKeyword::new(
        "Should Be True",
        &["condition", "msg=None"],
        "Fails if the given condition is not true.",
        should_be_true,
    ),
    LibraryKeyword::new(
        "Should Contain",
        &["container", "item", "msg=None", "values=True", "ignore_case=False"],
        "Fails if `container` does not contain `item` one or more times.",
        should_contain,
    ),
    LibraryKeyword::new(
        "Get Length",
        &["item"],
        "Returns and logs the length of the given item.",
        get_length,
    ),
    LibraryKeyword::new(
        "Fail",
        &["msg=None", "*tags"],
        "Fails the test with the given message.",
        fail,
    ),
    LibraryKeyword::new(
        "Fatal Error",
        &["msg=None"],
        "Stops the whole test execution.",
        fatal_error,
    ),
    LibraryKeyword::new(
        "Skip",
        &["msg=Skipped with Skip keyword."],
        "Skips the rest of the current test.",
        skip,
    ),
    LibraryKeyword::new(
        "Pass Execution",
        &["message", "*tags"],
        "Skips rest of the current test, setup, or teardown with PASS status.",
        pass_execution,
    ),
    LibraryKeyword::new(
        "Run Keyword",
        &["name", "*args"],
        "Executes the given keyword with the given arguments.",
        run_keyword,
    ),
    LibraryKeyword::new(
        "Run Keyword If",
        &["condition", "name", "*args"],
        "Runs the given keyword with the given arguments, if `condition` is true.",
        run_keyword_if,
    ),
    LibraryKeyword::new(
        "Run Keyword And Ignore Error",
        &["name", "*args"],
        "Runs the given keyword with the given arguments and ignores possible error.",
        run_keyword_and_ignore_error,
    ),
    LibraryKeyword::new(
        "Run Keyword And Expect Error",
        &["expected_error", "name", "*args"],
        "Runs the keyword and checks that the expected error occurred.",
        run_keyword_and_expect_error,
    ),
    LibraryKeyword::new(
        "Create List",
        &["*items"],
        "Returns a list containing given items.",
        create_list,
    ),
    LibraryKeyword::new(
        "Create Dictionary",
        &["*items", "**entries"],
        "Creates and returns a dictionary based on the given `items`.",
        create_dictionary,
    ),
    LibraryKeyword::new(
        "Catenate",
        &["*items"],
        "Catenates the given items together and returns the resulted string.",
        catenate,
    ),
    LibraryKeyword::new(
        "Convert To Integer",
        &["item", "base=None"],
        "Converts the given item to an integer number.",
        convert_to_integer,
    ),
    LibraryKeyword::new(
        "Sleep",
        &["time_", "reason=None"],
        "Pauses the test executed for the given time.",
        sleep,
    ),
    LibraryKeyword::new(
        "Import Library",
        &["name", "*args"],
        "Imports a library with the given name and optional arguments.",
        import_library,
    ),
    LibraryKeyword::new(
        "Import Resource",
        &["path"],
        "Imports a resource file with the given path.",
        import_resource,
    ),
];

fn strings(values: Vec<Value>) -> Vec<String> {
    values.into_iter().map(|v| v.to_string()).collect()
}

fn log(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let message = args.string();
    let level = args.string();
    let _html = args.flag();
    let console = args.flag();
    exec.log(&level, &message)?;
    if console {
        exec.console(&format!("{message}\n"));
    }
    Ok(Value::None)
}

fn log_many(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    for message in args.rest() {
        exec.log("INFO", &message.to_string())?;
    }
    Ok(Value::None)
}

fn no_operation(_exec: &mut Executor<'_, '_>, _args: &mut Args) -> KwResult {
    Ok(Value::None)
}

fn set_log_level(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    exec.set_log_level(&args.string()).map(Value::Str)
}

fn set_variable(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let mut values = args.rest();
    Ok(match values.len() {
        0 => Value::str(""),
        1 => values.remove(0),
        _ => Value::list(values),
    })
}

/// Parse the `${name}` argument of the `Set * Variable` keywords.
fn variable_name(exec: &Executor<'_, '_>, raw: &str) -> KwResult<(String, String)> {
    let raw = raw.strip_prefix('\\').unwrap_or(raw);
    let Some((sigil, base)) = split_decorated(raw).filter(|(sigil, _)| *sigil != '%') else {
        return Err(Failure::fail(format!("Invalid variable name '{raw}'.")));
    };
    let base = exec.vars.replace_string(base)?;
    Ok((format!("{sigil}{{{base}}}"), base))
}

/// The value for a `Set * Variable` call; no values keeps the current one.
fn variable_value(
    exec: &Executor<'_, '_>,
    decorated: &str,
    base: &str,
    values: Vec<Value>,
) -> KwResult {
    let sigil = decorated.chars().next().unwrap_or('$');
    if values.is_empty() {
        return exec
            .vars
            .get(base)
            .cloned()
            .ok_or_else(|| Failure::fail(format!("Variable '{decorated}' not found.")));
    }
    match sigil {
        '@' => match values.as_slice() {
            [Value::List(_)] => Ok(values[0].clone()),
            _ => Ok(Value::list(values)),
        },
        '&' => match values.as_slice() {
            [Value::Dict(_)] => Ok(values[0].clone()),
            _ => {
                let items = strings(values);
                exec.dict_from_items(&items)
            }
        },
        _ => match values.len() {
            1 => Ok(values.into_iter().next().unwrap_or_default()),
            _ => Ok(Value::Str(strings(values).join(" "))),
        },
    }
}

fn set_test_variable(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (decorated, base) = variable_name(exec, &args.string())?;
    let value = variable_value(exec, &decorated, &base, args.rest())?;
    exec.vars.set_test(&decorated, &base, value)?;
    Ok(Value::None)
}

fn set_suite_variable(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (decorated, base) = variable_name(exec, &args.string())?;
    let value = variable_value(exec, &decorated, &base, args.rest())?;
    exec.vars.set_suite(&decorated, &base, value);
    Ok(Value::None)
}

fn equal_values(first: &Value, second: &Value, ignore_case: bool) -> bool {
    match (first, second) {
        (Value::Str(a), Value::Str(b)) if ignore_case => a.to_lowercase() == b.to_lowercase(),
        _ => first == second,
    }
}

fn should_be_equal(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (first, second) = (args.value(), args.value());
    let (msg, values, ignore_case) = (args.opt_string(), args.flag(), args.flag());
    if equal_values(&first, &second, ignore_case) {
        return Ok(Value::None);
    }
    Err(assertion(msg, values, format!("{first} != {second}")))
}

fn should_not_be_equal(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (first, second) = (args.value(), args.value());
    let (msg, values, ignore_case) = (args.opt_string(), args.flag(), args.flag());
    if !equal_values(&first, &second, ignore_case) {
        return Ok(Value::None);
    }
    Err(assertion(msg, values, format!("{first} == {second}")))
}

fn to_integer(value: &Value) -> KwResult<i64> {
    value.as_int().ok_or_else(|| {
        Failure::fail(format!("'{value}' cannot be converted to an integer."))
    })
}

fn should_be_equal_as_integers(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (first, second) = (to_integer(&args.value())?, to_integer(&args.value())?);
    let (msg, values) = (args.opt_string(), args.flag());
    if first == second {
        return Ok(Value::None);
    }
    Err(assertion(msg, values, format!("{first} != {second}")))
}

fn should_be_equal_as_strings(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (first, second) = (args.string(), args.string());
    let (msg, values, ignore_case) = (args.opt_string(), args.flag(), args.flag());
    let equal = if ignore_case {
        first.to_lowercase() == second.to_lowercase()
    } else {
        first == second
    };
    if equal {
        return Ok(Value::None);
    }
    Err(assertion(msg, values, format!("{first} != {second}")))
}

fn condition(value: &Value) -> KwResult<bool> {
    match value {
        Value::Str(expr) => evaluate_condition(expr).map_err(|err| {
            Failure::fail(format!("Evaluating expression '{expr}' failed: {err}"))
        }),
        other => Ok(other.truthy()),
    }
}

fn should_be_true(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let value = args.value();
    let msg = args.opt_string();
    if condition(&value)? {
        return Ok(Value::None);
    }
    Err(failure(msg, || format!("'{value}' should be true.")))
}

fn length_of(item: &Value) -> KwResult<usize> {
    item.length()
        .ok_or_else(|| Failure::fail(format!("Could not get length of '{item}'.")))
}

fn contains(container: &Value, item: &Value, ignore_case: bool) -> KwResult<bool> {
    let fold = |text: &str| {
        if ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    };
    match container {
        Value::Str(text) => Ok(fold(text).contains(&fold(&item.to_string()))),
        Value::List(items) => Ok(items
            .borrow()
            .iter()
            .any(|candidate| equal_values(candidate, item, ignore_case))),
        Value::Dict(items) => {
            let key = fold(&item.to_string());
            Ok(items.borrow().iter().any(|(k, _)| fold(k) == key))
        }
        other => Err(Failure::fail(format!(
            "Converting '{other}' to list failed: {} is not iterable.",
            other.type_name()
        ))),
    }
}

fn should_contain(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (container, item) = (args.value(), args.value());
    let (msg, values, ignore_case) = (args.opt_string(), args.flag(), args.flag());
    if contains(&container, &item, ignore_case)? {
        return Ok(Value::None);
    }
    Err(assertion(
        msg,
        values,
        format!("{} does not contain {}", container.repr(), item.repr()),
    ))
}

fn get_length(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let length = length_of(&args.value())?;
    exec.log("INFO", &format!("Length is {length}."))?;
    Ok(Value::Int(i64::try_from(length).unwrap_or(i64::MAX)))
}

/// `Fail` and `Pass Execution` tags: `-tag` removes, anything else adds.
fn apply_tags(exec: &mut Executor<'_, '_>, tags: Vec<Value>) -> KwResult<()> {
    if tags.is_empty() {
        return Ok(());
    }
    let (remove, add): (Vec<String>, Vec<String>) = strings(tags)
        .into_iter()
        .partition(|tag| tag.starts_with('-'));
    let remove: Vec<String> = remove.into_iter().map(|t| t[1..].to_string()).collect();
    if !remove.is_empty() {
        exec.set_tags(&remove, true)?;
    }
    if !add.is_empty() {
        exec.set_tags(&add, false)?;
    }
    Ok(())
}

fn fail(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let msg = args.opt_string();
    apply_tags(exec, args.rest())?;
    Err(Failure::fail(msg.unwrap_or_else(|| "AssertionError".to_string())))
}

fn fatal_error(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let msg = args.opt_string();
    Err(Failure::fatal(msg.unwrap_or_else(|| "AssertionError".to_string())))
}

fn skip(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    Err(Failure::skip(args.string()))
}

fn pass_execution(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let message = args.string();
    if message.trim().is_empty() {
        return Err(Failure::fail("Message cannot be empty."));
    }
    apply_tags(exec, args.rest())?;
    Err(Failure::pass(message))
}

fn run_keyword(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let name = args.string();
    exec.run_keyword(&name, args.rest())
}

/// Split `Run Keyword If` arguments at `ELSE IF` and `ELSE`.
fn conditional_branches(
    first_condition: Value,
    name: Value,
    rest: Vec<Value>,
) -> KwResult<Vec<(Option<Value>, Vec<Value>)>> {
    let mut branches: Vec<(Option<Value>, Vec<Value>)> = vec![(Some(first_condition), vec![name])];
    let mut items = rest.into_iter().peekable();
    while let Some(item) = items.next() {
        match &item {
            Value::Str(s) if s == "ELSE IF" => {
                let condition = items
                    .next()
                    .ok_or_else(|| Failure::fail("ELSE IF requires condition."))?;
                branches.push((Some(condition), Vec::new()));
            }
            Value::Str(s) if s == "ELSE" => branches.push((None, Vec::new())),
            _ => {
                if let Some((_, call)) = branches.last_mut() {
                    call.push(item);
                }
            }
        }
    }
    if branches.iter().any(|(_, call)| call.is_empty()) {
        return Err(Failure::fail("Keyword name missing after ELSE or ELSE IF."));
    }
    Ok(branches)
}

fn run_keyword_if(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let (first, name) = (args.value(), args.value());
    let branches = conditional_branches(first, name, args.rest())?;
    for (cond, mut call) in branches {
        let taken = match &cond {
            Some(cond) => condition(cond)?,
            None => true,
        };
        if taken {
            let name = call.remove(0).to_string();
            return exec.run_keyword(&name, call);
        }
    }
    Ok(Value::None)
}

fn run_keyword_and_ignore_error(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let name = args.string();
    match exec.run_keyword(&name, args.rest()) {
        Ok(value) => Ok(Value::list(vec![Value::str("PASS"), value])),
        Err(failure) if failure.is_recoverable() => Ok(Value::list(vec![
            Value::str("FAIL"),
            Value::Str(failure.message),
        ])),
        Err(failure) => Err(failure),
    }
}

/// Match an error message against `GLOB:`, `EQUALS:`, `STARTS:` or `REGEXP:` patterns.
fn error_matches(expected: &str, actual: &str) -> KwResult<bool> {
    if let Some(text) = expected.strip_prefix("EQUALS:") {
        return Ok(actual == text.trim_start());
    }
    if let Some(text) = expected.strip_prefix("STARTS:") {
        return Ok(actual.starts_with(text.trim_start()));
    }
    if let Some(pattern) = expected.strip_prefix("REGEXP:") {
        let regex = compile_regex(&format!("^(?:{})$", pattern.trim_start()))?;
        return Ok(regex.is_match(actual));
    }
    let pattern = expected.strip_prefix("GLOB:").map_or(expected, str::trim_start);
    Ok(glob_matches(pattern, actual, false))
}

fn run_keyword_and_expect_error(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let expected = args.string();
    let name = args.string();
    match exec.run_keyword(&name, args.rest()) {
        Ok(_) => Err(Failure::fail(format!(
            "Expected error '{expected}' did not occur."
        ))),
        Err(failure) if failure.is_recoverable() => {
            if error_matches(&expected, &failure.message)? {
                Ok(Value::Str(failure.message))
            } else {
                Err(Failure::fail(format!(
                    "Expected error '{expected}' but got '{}'.",
                    failure.message
                )))
            }
        }
        Err(failure) => Err(failure),
    }
}

fn pause(exec: &Executor<'_, '_>, duration: Duration) -> KwResult<()> {
    let duration = match exec.remaining_time() {
        Some(remaining) => duration.min(remaining),
        None => duration,
    };
    std::thread::sleep(duration);
    exec.after_sleep()
}

fn create_list(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    Ok(Value::list(args.rest()))
}

fn create_dictionary(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let items = strings(args.rest());
    let Value::Dict(dict) = exec.dict_from_items(&items)? else {
        return Ok(Value::dict(Vec::new()));
    };
    for (key, value) in args.entries() {
        let mut entries = dict.borrow_mut();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }
    Ok(Value::Dict(dict))
}

fn catenate(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let mut items = strings(args.rest());
    let separator = match items.first().and_then(|first| first.strip_prefix("SEPARATOR=")) {
        Some(separator) => {
            let separator = separator.to_string();
            items.remove(0);
            separator
        }
        None => " ".to_string(),
    };
    Ok(Value::Str(items.join(&separator)))
}

fn convert_to_integer(_exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let item = args.value();
    let base = args.opt_int()?;
    let Some(base) = base else {
        return to_integer(&item).map(Value::Int);
    };
    let text = item.to_string();
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.trim_start_matches('+')),
    };
    let radix = u32::try_from(base)
        .ok()
        .filter(|radix| (2..=36).contains(radix))
        .ok_or_else(|| Failure::fail(format!("Invalid base '{base}'.")))?;
    i64::from_str_radix(digits, radix)
        .map(|n| Value::Int(if negative { -n } else { n }))
        .map_err(|_| {
            Failure::fail(format!(
                "'{text}' cannot be converted to an integer in base {base}."
            ))
        })
}

fn sleep(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let text = args.string();
    let reason = args.opt_string();
    let duration = parse_time(&text)
        .ok_or_else(|| Failure::fail(format!("Invalid time string '{text}'.")))?;
    pause(exec, duration)?;
    exec.log("INFO", &format!("Slept {text}."))?;
    if let Some(reason) = reason {
        exec.log("INFO", &reason)?;
    }
    Ok(Value::None)
}

fn import_library(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    let name = args.string();
    let mut rest = args.rest();
    let alias = match rest.len().checked_sub(2).map(|ix| rest[ix].to_string()) {
        Some(marker) if marker == "AS" || marker == "WITH NAME" => {
            let alias = rest.pop().map(|v| v.to_string());
            rest.pop();
            alias
        }
        _ => None,
    };
    exec.import_library(&name, &rest, alias.as_deref())?;
    Ok(Value::None)
}

fn import_resource(exec: &mut Executor<'_, '_>, args: &mut Args) -> KwResult {
    exec.import_resource(&args.string())?;
    Ok(Value::None)
}
