//! Variable scopes and `${}` / `@{}` / `&{}` / `%{}` substitution.

use super::failure::{Failure, KwResult};
use super::value::{parse_int, Value};
use rfi_core::normalize_name;
use std::collections::HashMap;

/// Storage key of a variable base name (`${Host Name}` → `hostname`).
pub(crate) fn variable_key(base: &str) -> String {
    let key = normalize_name(base);
    if key.is_empty() {
        base.to_string()
    } else {
        key
    }
}

/// Split `${name}` into its sigil and base name.
pub(crate) fn split_decorated(name: &str) -> Option<(char, &str)> {
    let mut chars = name.chars();
    let sigil = chars.next().filter(|c| matches!(c, '$' | '@' | '&' | '%'))?;
    let rest = chars.as_str().strip_prefix('{')?.strip_suffix('}')?;
    Some((sigil, rest))
}

type Scope = HashMap<String, (String, Value)>;

/// Global, suite, test and keyword-local scopes, searched innermost first.
#[derive(Debug, Default)]
pub(crate) struct VariableStore {
    global: Scope,
    suite: Scope,
    test: Option<Scope>,
    locals: Vec<Scope>,
}

impl VariableStore {
    pub fn get(&self, base: &str) -> Option<&Value> {
        let key = variable_key(base);
        self.locals
            .last()
            .and_then(|scope| scope.get(&key))
            .or_else(|| self.test.as_ref().and_then(|scope| scope.get(&key)))
            .or_else(|| self.suite.get(&key))
            .or_else(|| self.global.get(&key))
            .map(|(_, value)| value)
    }

    fn insert(scope: &mut Scope, decorated: &str, base: &str, value: Value) {
        scope.insert(variable_key(base), (decorated.to_string(), value));
    }

    /// Assign in the innermost scope: keyword locals, then the test, then the suite.
    pub fn set_local(&mut self, decorated: &str, base: &str, value: Value) {
        let scope = match (self.locals.last_mut(), self.test.as_mut()) {
            (Some(scope), _) => scope,
            (None, Some(scope)) => scope,
            (None, None) => &mut self.suite,
        };
        Self::insert(scope, decorated, base, value);
    }

    pub fn set_test(&mut self, decorated: &str, base: &str, value: Value) -> KwResult<()> {
        let Some(scope) = self.test.as_mut() else {
            return Err(Failure::fail(
                "Cannot set test variable when no test is started.",
            ));
        };
        Self::insert(scope, decorated, base, value.clone());
        if let Some(local) = self.locals.last_mut() {
            local.remove(&variable_key(base));
        }
        Ok(())
    }

    pub fn set_suite(&mut self, decorated: &str, base: &str, value: Value) {
        let key = variable_key(base);
        if let Some(test) = self.test.as_mut() {
            test.remove(&key);
        }
        if let Some(local) = self.locals.last_mut() {
            local.remove(&key);
        }
        Self::insert(&mut self.suite, decorated, base, value);
    }

    pub fn set_builtin(&mut self, decorated: &str, value: Value) {
        if let Some((_, base)) = split_decorated(decorated) {
            Self::insert(&mut self.global, decorated, base, value);
        }
    }

    pub fn start_test(&mut self, builtins: impl IntoIterator<Item = (&'static str, Value)>) {
        self.test = Some(Scope::new());
        self.set_test_builtins(builtins);
    }

    /// Set decorated built-ins in the test scope; does nothing outside a test.
    pub fn set_test_builtins(&mut self, builtins: impl IntoIterator<Item = (&'static str, Value)>) {
        let Some(scope) = self.test.as_mut() else {
            return;
        };
        for (decorated, value) in builtins {
            if let Some((_, base)) = split_decorated(decorated) {
                Self::insert(scope, decorated, base, value);
            }
        }
    }

    pub fn end_test(&mut self) {
        self.test = None;
        self.locals.clear();
    }

    pub fn push_frame(&mut self) {
        self.locals.push(Scope::new());
    }

    pub fn pop_frame(&mut self) {
        self.locals.pop();
    }

    pub fn replace_string(&self, text: &str) -> KwResult<String> {
        let mut out = String::new();
        let mut pos = 0;
        while let Some(found) = find_variable(text, pos) {
            out.push_str(&unescape(&text[pos..found.start]));
            out.push_str(&self.resolve(text, &found)?.to_string());
            pos = found.end;
        }
        out.push_str(&unescape(&text[pos..]));
        Ok(out)
    }

    /// Like [`Self::replace_string`], but a cell that is exactly one variable
    /// keeps the variable's value as is.
    pub fn replace_scalar(&self, text: &str) -> KwResult<Value> {
        match find_variable(text, 0) {
            Some(found) if found.start == 0 && found.end == text.len() => {
                self.resolve(text, &found)
            }
            _ => self.replace_string(text).map(Value::Str),
        }
    }

    /// Substitute a list of cells; a cell that is exactly `@{list}` expands
    /// into the list's items.
    pub fn replace_list(&self, cells: &[String]) -> KwResult<Vec<Value>> {
        let mut out = Vec::with_capacity(cells.len());
        for cell in cells {
            match whole_variable(cell) {
                Some(found) if found.sigil == '@' => match self.resolve(cell, &found)? {
                    Value::List(items) => out.extend(items.borrow().iter().cloned()),
                    other => out.push(other),
                },
                _ => out.push(self.replace_scalar(cell)?),
            }
        }
        Ok(out)
    }

    fn resolve(&self, text: &str, found: &VariableMatch) -> KwResult<Value> {
        let base = self.replace_string(&text[found.name.clone()])?;
        let decorated = format!("{}{{{}}}", found.sigil, base);

        let mut value = if found.sigil == '%' {
            let (name, default) = match base.split_once('=') {
                Some((name, default)) => (name, Some(default)),
                None => (base.as_str(), None),
            };
            match (std::env::var(name), default) {
                (Ok(value), _) => Value::Str(value),
                (Err(_), Some(default)) => Value::str(default),
                (Err(_), None) => {
                    return Err(Failure::fail(format!(
                        "Environment variable '%{{{name}}}' not found."
                    )))
                }
            }
        } else if found.sigil != '$' && variable_key(&base) == "empty" {
            match found.sigil {
                '@' => Value::list(Vec::new()),
                _ => Value::dict(Vec::new()),
            }
        } else {
            match self.get(&base) {
                Some(value) => value.clone(),
                None => literal(found.sigil, &base).ok_or_else(|| {
                    Failure::fail(format!("Variable '{decorated}' not found."))
                })?,
            }
        };

        for item in &found.items {
            let index = self.replace_string(&text[item.clone()])?;
            value = item_of(&decorated, &value, &index)?;
        }

        match found.sigil {
            '@' => match value {
                Value::List(_) => Ok(value),
                Value::Dict(items) => Ok(Value::list(
                    items.borrow().iter().map(|(k, _)| Value::str(k.as_str())).collect(),
                )),
                Value::Str(s) => Ok(Value::list(
                    s.chars().map(|c| Value::Str(c.to_string())).collect(),
                )),
                other => Err(Failure::fail(format!(
                    "Value of variable '{decorated}' is not list or list-like: {}",
                    other.type_name()
                ))),
            },
            '&' => match value {
                Value::Dict(_) => Ok(value),
                other => Err(Failure::fail(format!(
                    "Value of variable '{decorated}' is not dictionary or dictionary-like: {}",
                    other.type_name()
                ))),
            },
            _ => Ok(value),
        }
    }
}

/// `${1}`, `${-2.5}` and friends.
fn literal(sigil: char, base: &str) -> Option<Value> {
    if sigil != '$' {
        return None;
    }
    if let Some(int) = parse_int(base) {
        return Some(Value::Int(int));
    }
    if base.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(float) = base.trim().parse::<f64>() {
            return Some(Value::Float(float));
        }
    }
    None
}

fn item_of(decorated: &str, value: &Value, index: &str) -> KwResult<Value> {
    match value {
        Value::List(items) => {
            let items = items.borrow();
            if let Some((from, to)) = index.split_once(':') {
                let bound = |s: &str, default: usize| -> KwResult<usize> {
                    if s.trim().is_empty() {
                        return Ok(default);
                    }
                    let n = parse_int(s).ok_or_else(|| {
                        Failure::fail(format!(
                            "List '{decorated}' used with invalid index '{index}'."
                        ))
                    })?;
                    let clamped = if n < 0 { 0 } else { items.len() };
                    Ok(normalize_index(n, items.len()).unwrap_or(clamped))
                };
                let (from, to) = (bound(from, 0)?, bound(to, items.len())?);
                let slice = if from < to { items[from..to].to_vec() } else { Vec::new() };
                return Ok(Value::list(slice));
            }
            let n = parse_int(index).ok_or_else(|| {
                Failure::fail(format!("List '{decorated}' used with invalid index '{index}'."))
            })?;
            normalize_index(n, items.len())
                .and_then(|ix| items.get(ix).cloned())
                .ok_or_else(|| {
                    Failure::fail(format!("List '{decorated}' has no item in index {n}."))
                })
        }
        Value::Dict(items) => items
            .borrow()
            .iter()
            .find(|(k, _)| k == index)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| {
                Failure::fail(format!("Dictionary '{decorated}' has no key '{index}'."))
            }),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            parse_int(index)
                .and_then(|n| normalize_index(n, chars.len()))
                .and_then(|ix| chars.get(ix))
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| {
                    Failure::fail(format!("String '{decorated}' has no item in index {index}."))
                })
        }
        other => Err(Failure::fail(format!(
            "Variable '{decorated}' is {}, which is not subscriptable.",
            other.type_name()
        ))),
    }
}

fn normalize_index(n: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let ix = if n < 0 { len + n } else { n };
    (0..len).contains(&ix).then_some(ix as usize)
}

/// Remove escapes: `\n`, `\t` and `\r` become control characters, any other
/// escaped character stands for itself.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Byte ranges of one variable occurrence in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VariableMatch {
    pub sigil: char,
    pub start: usize,
    pub end: usize,
    /// Range of the text between the braces.
    pub name: std::ops::Range<usize>,
    /// Ranges of the text inside each trailing `[...]`.
    pub items: Vec<std::ops::Range<usize>>,
}

/// The variable spanning all of `text`, if any.
pub(crate) fn whole_variable(text: &str) -> Option<VariableMatch> {
    find_variable(text, 0).filter(|found| found.start == 0 && found.end == text.len())
}

/// Find the next unescaped variable at or after byte `from`.
pub(crate) fn find_variable(text: &str, from: usize) -> Option<VariableMatch> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i + 1 < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' | b'@' | b'&' | b'%' if bytes[i + 1] == b'{' => {
                let Some(close) = matching(bytes, i + 1, b'{', b'}') else {
                    return None;
                };
                let sigil = bytes[i] as char;
                let mut found = VariableMatch {
                    sigil,
                    start: i,
                    end: close + 1,
                    name: i + 2..close,
                    items: Vec::new(),
                };
                if sigil != '%' {
                    while bytes.get(found.end) == Some(&b'[') {
                        let Some(close) = matching(bytes, found.end, b'[', b']') else {
                            break;
                        };
                        found.items.push(found.end + 1..close);
                        found.end = close + 1;
                    }
                }
                return Some(found);
            }
            _ => i += 1,
        }
    }
    None
}

fn matching(bytes: &[u8], open_at: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open_at;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> VariableStore {
        let mut store = VariableStore::default();
        store.set_builtin("${SPACE}", Value::str(" "));
        store.set_local("${Host Name}", "Host Name", Value::str("example.org"));
        store.set_local(
            "@{ITEMS}",
            "ITEMS",
            Value::list(vec![Value::str("a"), Value::str("b"), Value::str("c")]),
        );
        store.set_local(
            "&{MAP}",
            "MAP",
            Value::dict(vec![("key".to_string(), Value::str("v"))]),
        );
        store
    }

    #[test]
    fn substitutes_inside_strings() {
        let store = store();
        assert_eq!(
            store.replace_string("http://${host_name}/${ITEMS}[0]").unwrap(),
            "http://example.org/a"
        );
        assert_eq!(store.replace_string("a${SPACE}b").unwrap(), "a b");
        assert_eq!(store.replace_string(r"\${HOSTNAME}").unwrap(), "${HOSTNAME}");
        assert_eq!(store.replace_string("${MAP}[key]").unwrap(), "v");
        assert_eq!(store.replace_string("${ITEMS}[-1]").unwrap(), "c");
    }

    #[test]
    fn keeps_types_of_whole_cell_variables() {
        let store = store();
        assert_eq!(store.replace_scalar("${42}").unwrap(), Value::Int(42));
        assert_eq!(store.replace_scalar("${1.5}").unwrap(), Value::Float(1.5));
        assert!(matches!(store.replace_scalar("${ITEMS}").unwrap(), Value::List(_)));
        assert_eq!(
            store.replace_scalar("${ITEMS}[1:]").unwrap(),
            Value::list(vec![Value::str("b"), Value::str("c")])
        );
    }

    #[test]
    fn expands_lists_in_argument_position() {
        let store = store();
        let cells = vec!["x".to_string(), "@{ITEMS}".to_string()];
        let values: Vec<String> = store
            .replace_list(&cells)
            .unwrap()
            .iter()
            .map(Value::to_string)
            .collect();
        assert_eq!(values, vec!["x", "a", "b", "c"]);
    }

    #[test]
    fn nested_names_and_missing_variables() {
        let mut store = store();
        store.set_local("${which}", "which", Value::str("hostname"));
        assert_eq!(store.replace_string("${${which}}").unwrap(), "example.org");
        assert_eq!(
            store.replace_string("${missing}").unwrap_err().message,
            "Variable '${missing}' not found."
        );
        assert_eq!(
            store.replace_string("%{RFI_SURELY_UNSET_VARIABLE=fallback}").unwrap(),
            "fallback"
        );
    }

    #[test]
    fn scopes_shadow_and_reset() {
        let mut store = VariableStore::default();
        store.set_suite("${x}", "x", Value::str("suite"));
        store.start_test([("${TEST_NAME}", Value::str("T"))]);
        assert_eq!(store.get("TEST_NAME"), Some(&Value::str("T")));
        store.set_local("${x}", "x", Value::str("test"));
        store.push_frame();
        assert_eq!(store.get("x"), Some(&Value::str("test")));
        store.set_local("${x}", "x", Value::str("local"));
        assert_eq!(store.get("x"), Some(&Value::str("local")));
        store.pop_frame();
        assert_eq!(store.get("x"), Some(&Value::str("test")));
        store.end_test();
        assert_eq!(store.get("x"), Some(&Value::str("suite")));
    }
}
