//! Standard libraries available to [`crate::BasicRunner`].
//!
//! Every library is a static table of [`LibraryKeyword`]s. A keyword declares
//! its parameters in `name`, `name=default`, `*varargs`, `**kwargs` form and
//! receives the bound values, in parameter order, through [`Args`].

mod builtin;
mod collections;
mod os;
mod string;

use super::executor::Executor;
use super::failure::{Failure, KwResult};
use super::value::{DictRef, ListRef, Value};
use crate::listener::{DocSource, KeywordSpec, LibraryDoc};
use regex::Regex;
use rfi_core::same_name;
use std::collections::VecDeque;

pub(crate) type KeywordFn = fn(&mut Executor<'_, '_>, &mut Args) -> KwResult;

pub(crate) struct LibraryKeyword {
    pub name: &'static str,
    pub args: &'static [&'static str],
    pub doc: &'static str,
    /// Leading arguments passed as written, without variable substitution.
    pub raw_args: usize,
    pub run: KeywordFn,
}

impl LibraryKeyword {
    pub(crate) const fn new(
        name: &'static str,
        args: &'static [&'static str],
        doc: &'static str,
        run: KeywordFn,
    ) -> Self {
        Self {
            name,
            args,
            doc,
            raw_args: 0,
            run,
        }
    }

    pub(crate) const fn raw(mut self, count: usize) -> Self {
        self.raw_args = count;
        self
    }
}

pub(crate) struct Library {
    pub name: &'static str,
    pub doc: &'static str,
    pub keywords: &'static [LibraryKeyword],
}

impl Library {
    pub fn keyword(&'static self, name: &str) -> Option<&'static LibraryKeyword> {
        self.keywords.iter().find(|kw| same_name(kw.name, name))
    }

    /// Documentation reported to listeners, under the name the library was imported as.
    pub fn doc(&self, alias: &str) -> LibraryDoc {
        LibraryDoc {
            name: alias.to_string(),
            source: DocSource::Library,
            doc: self.doc.to_string(),
            keywords: self
                .keywords
                .iter()
                .map(|kw| KeywordSpec {
                    name: kw.name.to_string(),
                    args: kw.args.iter().map(|arg| arg.to_string()).collect(),
                    doc: kw.doc.to_string(),
                    tags: Vec::new(),
                })
                .collect(),
        }
    }
}

/// Libraries a run may import by name.
pub(crate) struct LibraryRegistry {
    libraries: Vec<&'static Library>,
}

impl LibraryRegistry {
    pub fn standard() -> Self {
        Self {
            libraries: vec![
                &builtin::LIBRARY,
                &collections::LIBRARY,
                &string::LIBRARY,
                &os::LIBRARY,
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static Library> {
        self.libraries.iter().copied().find(|lib| lib.name == name)
    }

    pub fn builtin(&self) -> &'static Library {
        &builtin::LIBRARY
    }
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Bound arguments of one library keyword call, consumed in parameter order.
pub(crate) struct Args {
    keyword: &'static str,
    values: VecDeque<Value>,
}

impl Args {
    pub fn new(keyword: &'static str, values: Vec<Value>) -> Self {
        Self {
            keyword,
            values: values.into(),
        }
    }

    pub fn value(&mut self) -> Value {
        self.values.pop_front().unwrap_or_default()
    }

    pub fn string(&mut self) -> String {
        self.value().to_string()
    }

    /// `None` for an omitted `arg=None` parameter.
    pub fn opt_string(&mut self) -> Option<String> {
        match self.value() {
            Value::None => None,
            other => Some(other.to_string()),
        }
    }

    pub fn flag(&mut self) -> bool {
        self.value().truthy()
    }

    pub fn int(&mut self) -> KwResult<i64> {
        let value = self.value();
        value.as_int().ok_or_else(|| {
            Failure::fail(format!(
                "Keyword '{}' expected an integer, got '{value}'.",
                self.keyword
            ))
        })
    }

    pub fn opt_int(&mut self) -> KwResult<Option<i64>> {
        match self.values.front() {
            Some(Value::None) => {
                self.values.pop_front();
                Ok(None)
            }
            _ => self.int().map(Some),
        }
    }

    /// The items of a `*varargs` parameter.
    pub fn rest(&mut self) -> Vec<Value> {
        match self.value() {
            Value::List(items) => items.borrow().clone(),
            Value::None => Vec::new(),
            other => vec![other],
        }
    }

    /// The entries of a `**kwargs` parameter.
    pub fn entries(&mut self) -> Vec<(String, Value)> {
        match self.value() {
            Value::Dict(items) => items.borrow().clone(),
            _ => Vec::new(),
        }
    }

    pub fn list(&mut self) -> KwResult<ListRef> {
        match self.value() {
            Value::List(items) => Ok(items),
            other => Err(Failure::fail(format!(
                "Expected argument to be a list, got {}.",
                other.type_name()
            ))),
        }
    }

    pub fn dict(&mut self) -> KwResult<DictRef> {
        match self.value() {
            Value::Dict(items) => Ok(items),
            other => Err(Failure::fail(format!(
                "Expected argument to be a dictionary, got {}.",
                other.type_name()
            ))),
        }
    }
}

/// Failure with a custom message, or the default one.
pub(crate) fn failure(custom: Option<String>, default: impl FnOnce() -> String) -> Failure {
    Failure::fail(custom.unwrap_or_else(default))
}

/// Failure for assertions taking `msg` and `values`: with `values` the
/// custom message is prefixed to the default one.
pub(crate) fn assertion(custom: Option<String>, values: bool, default: String) -> Failure {
    match custom {
        Some(msg) if values => Failure::fail(format!("{msg}: {default}")),
        Some(msg) => Failure::fail(msg),
        None => Failure::fail(default),
    }
}

pub(crate) fn compile_regex(pattern: &str) -> KwResult<Regex> {
    Regex::new(pattern)
        .map_err(|err| Failure::fail(format!("Invalid regular expression '{pattern}': {err}")))
}

/// Glob matching with `*` and `?`, over the whole text.
pub(crate) fn glob_matches(pattern: &str, text: &str, ignore_case: bool) -> bool {
    let mut expr = String::from(if ignore_case { "(?is)^" } else { "(?s)^" });
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).is_ok_and(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_knows_the_standard_libraries() {
        let registry = LibraryRegistry::standard();
        for name in ["BuiltIn", "Collections", "String", "OperatingSystem"] {
            assert!(registry.get(name).is_some(), "{name}");
        }
        assert!(registry.get("SeleniumLibrary").is_none());
        assert!(registry.builtin().keyword("should_be_equal").is_some());
    }

    #[test]
    fn keyword_tables_have_unique_names() {
        let registry = LibraryRegistry::standard();
        for library in &registry.libraries {
            let mut names: Vec<String> = library
                .keywords
                .iter()
                .map(|kw| rfi_core::normalize_name(kw.name))
                .collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "{}", library.name);
        }
    }

    #[test]
    fn globs() {
        assert!(glob_matches("No keyword*", "No keyword with name 'x' found.", false));
        assert!(glob_matches("a?c", "abc", false));
        assert!(!glob_matches("a?c", "abbc", false));
        assert!(glob_matches("ABC", "abc", true));
        assert!(glob_matches("1 + 1", "1 + 1", false));
    }
}
