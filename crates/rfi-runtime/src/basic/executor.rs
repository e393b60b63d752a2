//! Keyword resolution and execution.

use super::args::{Arg, ArgSpec, Bound, ParamKind};
use super::failure::{Failure, FailureKind, KwResult};
use super::library::{Args, Library, LibraryKeyword, LibraryRegistry};
use super::time::parse_time;
use super::value::Value;
use super::variables::{split_decorated, whole_variable, VariableStore};
use crate::listener::{DocSource, KeywordSpec, LibraryDoc};
use crate::result::{LogMessage, Status, TestResult};
use crate::runner::RunContext;
use rfi_core::same_name;
use rfi_suite::{Import, ImportKind, Suite, TestCase, UserKeyword};
use rfi_syntax::{KeywordCall, SettingKind, Step};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Nesting limit for keyword calls.
const MAX_DEPTH: usize = 100;

const LOG_LEVELS: [&str; 6] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "NONE"];

struct ImportedLibrary {
    library: &'static Library,
    alias: String,
}

struct Resource {
    name: String,
    keywords: Vec<Rc<UserKeyword>>,
}

struct Deadline {
    at: Instant,
    owner: &'static str,
    text: String,
}

/// State of the test being executed.
struct TestState {
    tags: Vec<String>,
    messages: Vec<LogMessage>,
}

#[derive(Clone)]
enum Handler<'a> {
    User(&'a UserKeyword),
    Resource(Rc<UserKeyword>),
    Library(&'static LibraryKeyword, &'static str),
}

impl Handler<'_> {
    fn spec(&self) -> KwResult<ArgSpec> {
        match self {
            Handler::User(kw) => ArgSpec::user(&kw.name, &kw.arguments),
            Handler::Resource(kw) => ArgSpec::user(&kw.name, &kw.arguments),
            Handler::Library(kw, _) => Ok(ArgSpec::library(kw.args)),
        }
    }

    fn raw_args(&self) -> usize {
        match self {
            Handler::Library(kw, _) => kw.raw_args,
            _ => 0,
        }
    }
}

pub(crate) struct Executor<'a, 'l> {
    pub(crate) suite: &'a Suite,
    pub(crate) ctx: RunContext<'a, 'l>,
    pub(crate) vars: VariableStore,
    registry: &'a LibraryRegistry,
    libraries: Vec<ImportedLibrary>,
    resources: Vec<Resource>,
    visited: HashSet<PathBuf>,
    test: Option<TestState>,
    deadlines: Vec<Deadline>,
    depth: usize,
    log_level: usize,
    /// Set by `Fatal Error`; remaining tests are not run.
    pub(crate) fatal: bool,
}

impl<'a, 'l> Executor<'a, 'l> {
    pub(crate) fn new(
        suite: &'a Suite,
        ctx: RunContext<'a, 'l>,
        registry: &'a LibraryRegistry,
    ) -> Self {
        Self {
            suite,
            ctx,
            vars: VariableStore::default(),
            registry,
            libraries: Vec::new(),
            resources: Vec::new(),
            visited: HashSet::new(),
            test: None,
            deadlines: Vec::new(),
            depth: 0,
            log_level: 2,
            fatal: false,
        }
    }

    // ---------------------------------------------------------------------
    // Imports

    /// Import the suite's own `Library`, `Resource` and `Variables` settings.
    ///
    /// Failures are reported as errors against the import's line.
    pub(crate) fn import_suite(&mut self) {
        let suite = self.suite;
        for import in suite.imports.iter() {
            if let Err(failure) = self.import(import) {
                let source = suite.source.display().to_string();
                self.report(&source, import.line, &failure.message);
            }
        }
    }

    fn report(&mut self, source: &str, line: u32, message: &str) {
        tracing::debug!(target: "rfi.runtime", %source, line, error = message, "execution error");
        self.ctx
            .error(&format!("Error in file '{source}' on line {line}: {message}"));
    }

    fn import(&mut self, import: &Import) -> KwResult<()> {
        let name = self.vars.replace_string(&import.name)?;
        let args = self.vars.replace_list(&import.args)?;
        match import.kind {
            ImportKind::Library => self.import_library(&name, &args, import.alias.as_deref()),
            ImportKind::Resource => self.import_resource(&name),
            ImportKind::Variables => self.import_variables(&name),
        }
    }

    pub(crate) fn import_library(
        &mut self,
        name: &str,
        args: &[Value],
        alias: Option<&str>,
    ) -> KwResult<()> {
        let Some(library) = self.registry.get(name) else {
            return Err(Failure::fail(format!(
                "Importing library '{name}' failed: No library with name '{name}' is available."
            )));
        };
        if !args.is_empty() {
            return Err(Failure::fail(format!(
                "Importing library '{name}' failed: Library '{}' expected 0 arguments, got {}.",
                library.name,
                args.len()
            )));
        }
        let alias = alias.unwrap_or(library.name).to_string();
        if self.libraries.iter().any(|l| l.alias == alias) {
            return Ok(());
        }
        tracing::debug!(target: "rfi.runtime", library = library.name, %alias, "library imported");
        let doc = library.doc(&alias);
        self.libraries.push(ImportedLibrary { library, alias });
        self.ctx.library_import(&doc);
        Ok(())
    }

    pub(crate) fn import_resource(&mut self, path: &str) -> KwResult<()> {
        let source = self.resolve_path(path);
        if !self.visited.insert(source.clone()) {
            return Ok(());
        }
        let text = std::fs::read_to_string(&source).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Failure::fail(format!(
                    "Resource file '{}' does not exist.",
                    source.display()
                ))
            } else {
                Failure::fail(format!(
                    "Reading resource file '{}' failed: {err}",
                    source.display()
                ))
            }
        })?;

        let model = rfi_syntax::parse(&text);
        if let Some(err) = model.errors.first() {
            return Err(Failure::fail(format!(
                "Error in file '{}' on line {}: {}",
                source.display(),
                err.line,
                err.message
            )));
        }
        if model.tests().next().is_some() {
            return Err(Failure::fail(format!(
                "Resource file '{}' cannot contain tests or tasks.",
                source.display()
            )));
        }

        let name = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        let mut doc = String::new();
        let mut keyword_tags = Vec::new();
        let mut imports = Vec::new();
        for setting in model.settings() {
            match setting.kind {
                SettingKind::Documentation => doc = setting.values.join(" "),
                SettingKind::KeywordTags => keyword_tags.extend(setting.values.iter().cloned()),
                SettingKind::Library => {
                    imports.push(Import::library(&setting.values, setting.line))
                }
                SettingKind::Resource | SettingKind::Variables => {
                    let kind = if setting.kind == SettingKind::Resource {
                        ImportKind::Resource
                    } else {
                        ImportKind::Variables
                    };
                    let (first, args) = setting.values.split_first().map_or_else(
                        || (String::new(), Vec::new()),
                        |(first, args)| (first.clone(), args.to_vec()),
                    );
                    imports.push(Import {
                        kind,
                        name: first,
                        args,
                        alias: None,
                        line: setting.line,
                    });
                }
                _ => {}
            }
        }

        let keywords: Vec<Rc<UserKeyword>> = model
            .keywords()
            .map(|block| Rc::new(UserKeyword::from_block(block, &keyword_tags)))
            .collect();
        let spec = LibraryDoc {
            name: name.clone(),
            source: DocSource::Resource,
            doc,
            keywords: keywords.iter().map(|kw| user_keyword_spec(kw)).collect(),
        };
        self.resources.push(Resource { name, keywords });

        let file = source.display().to_string();
        for def in model.variables() {
            if let Err(failure) = self.set_variable_definition(&def.name, &def.values) {
                self.report(&file, def.line, &failure.message);
            }
        }
        for import in &imports {
            if let Err(failure) = self.import(import) {
                self.report(&file, import.line, &failure.message);
            }
        }

        tracing::debug!(
            target: "rfi.runtime",
            source = %file,
            keywords = spec.keywords.len(),
            "resource imported"
        );
        self.ctx.resource_import(&spec);
        Ok(())
    }

    pub(crate) fn import_variables(&mut self, path: &str) -> KwResult<()> {
        let source = self.resolve_path(path);
        let failed = |reason: String| {
            Failure::fail(format!(
                "Processing variable file '{}' failed: {reason}",
                source.display()
            ))
        };
        if source.extension().and_then(|ext| ext.to_str()) != Some("json") {
            return Err(failed("Only JSON variable files are supported.".to_string()));
        }
        let text = std::fs::read_to_string(&source).map_err(|err| failed(err.to_string()))?;
        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|err| failed(err.to_string()))?;
        let serde_json::Value::Object(map) = json else {
            return Err(failed("Top level value must be an object.".to_string()));
        };
        for (name, value) in &map {
            let value = Value::from_json(value);
            let decorated = match value {
                Value::List(_) => format!("@{{{name}}}"),
                Value::Dict(_) => format!("&{{{name}}}"),
                _ => format!("${{{name}}}"),
            };
            self.vars.set_suite(&decorated, name, value);
        }
        Ok(())
    }

    /// Set the suite's `*** Variables ***` in definition order.
    pub(crate) fn set_suite_variables(&mut self) {
        let suite = self.suite;
        let source = suite.source.display().to_string();
        for variable in suite.variables.iter() {
            if let Err(failure) = self.set_variable_definition(&variable.name, &variable.values) {
                self.report(&source, variable.line, &failure.message);
            }
        }
    }

    fn set_variable_definition(&mut self, name: &str, values: &[String]) -> KwResult<()> {
        let decorated = name.trim_end_matches('=').trim_end();
        let failed = |failure: Failure| {
            Failure::fail(format!(
                "Setting variable '{decorated}' failed: {}",
                failure.message
            ))
        };
        let Some((sigil, base)) = split_decorated(decorated) else {
            return Err(Failure::fail(format!("Invalid variable name '{decorated}'.")));
        };
        let value = match sigil {
            '@' => Value::list(self.vars.replace_list(values).map_err(failed)?),
            '&' => self.dict_from_items(values).map_err(failed)?,
            _ => match values {
                [] => Value::str(""),
                [single] => self.vars.replace_scalar(single).map_err(failed)?,
                many => Value::Str(
                    many.iter()
                        .map(|v| self.vars.replace_string(v))
                        .collect::<KwResult<Vec<_>>>()
                        .map_err(failed)?
                        .join(" "),
                ),
            },
        };
        self.vars.set_suite(decorated, base, value);
        Ok(())
    }

    /// Build a dictionary from `key=value` cells and whole `&{dict}` cells.
    pub(crate) fn dict_from_items(&self, items: &[String]) -> KwResult<Value> {
        let mut out: Vec<(String, Value)> = Vec::new();
        let mut put = |key: String, value: Value| match out.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => out.push((key, value)),
        };
        for item in items {
            if whole_variable(item).is_some_and(|found| found.sigil == '&') {
                if let Value::Dict(entries) = self.vars.replace_scalar(item)? {
                    for (k, v) in entries.borrow().iter() {
                        put(k.clone(), v.clone());
                    }
                }
                continue;
            }
            let Some((key, value)) = split_named(item) else {
                return Err(Failure::fail(format!(
                    "Invalid dictionary item '{item}': Items must use 'name=value' syntax or \
                     be dictionary variables themselves."
                )));
            };
            let key = self.vars.replace_string(key)?;
            put(key, self.vars.replace_scalar(value)?);
        }
        Ok(Value::dict(out))
    }

    /// Resolve `path` against the suite source directory.
    pub(crate) fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.suite.source.join(path)
        }
    }

    // ---------------------------------------------------------------------
    // Keyword lookup

    fn resolve(&self, name: &str) -> KwResult<Handler<'a>> {
        if let Some(handler) = self.resolve_unqualified(name)? {
            return Ok(handler);
        }
        for (ix, _) in name.match_indices('.') {
            let (owner, keyword) = (&name[..ix], &name[ix + 1..]);
            if let Some(handler) = self.resolve_qualified(owner, keyword) {
                return Ok(handler);
            }
        }
        Err(Failure::fail(format!("No keyword with name '{name}' found.")))
    }

    fn resolve_unqualified(&self, name: &str) -> KwResult<Option<Handler<'a>>> {
        let suite: &'a Suite = self.suite;
        if let Some(kw) = suite.keywords.iter().rev().find(|kw| same_name(&kw.name, name)) {
            return Ok(Some(Handler::User(kw)));
        }

        let found: Vec<(&str, Rc<UserKeyword>)> = self
            .resources
            .iter()
            .filter_map(|resource| {
                resource
                    .keywords
                    .iter()
                    .rev()
                    .find(|kw| same_name(&kw.name, name))
                    .map(|kw| (resource.name.as_str(), Rc::clone(kw)))
            })
            .collect();
        match found.len() {
            0 => {}
            1 => return Ok(found.into_iter().next().map(|(_, kw)| Handler::Resource(kw))),
            _ => {
                let owners = found.iter().map(|(owner, kw)| format!("{owner}.{}", kw.name));
                return Err(ambiguous(name, owners));
            }
        }

        let mut builtin = None;
        let mut found = Vec::new();
        for imported in &self.libraries {
            let Some(kw) = imported.library.keyword(name) else {
                continue;
            };
            if imported.library.name == "BuiltIn" {
                builtin.get_or_insert((kw, imported.library.name));
            } else {
                found.push((kw, imported.alias.as_str(), imported.library.name));
            }
        }
        match found.len() {
            0 => Ok(builtin.map(|(kw, owner)| Handler::Library(kw, owner))),
            1 => Ok(found
                .into_iter()
                .next()
                .map(|(kw, _, owner)| Handler::Library(kw, owner))),
            _ => {
                let owners = found.iter().map(|(kw, alias, _)| format!("{alias}.{}", kw.name));
                Err(ambiguous(name, owners))
            }
        }
    }

    fn resolve_qualified(&self, owner: &str, name: &str) -> Option<Handler<'a>> {
        let resource = self
            .resources
            .iter()
            .filter(|resource| same_name(&resource.name, owner))
            .find_map(|resource| {
                resource
                    .keywords
                    .iter()
                    .rev()
                    .find(|kw| same_name(&kw.name, name))
                    .cloned()
            });
        if let Some(kw) = resource {
            return Some(Handler::Resource(kw));
        }
        self.libraries
            .iter()
            .filter(|imported| same_name(&imported.alias, owner))
            .find_map(|imported| {
                imported
                    .library
                    .keyword(name)
                    .map(|kw| Handler::Library(kw, imported.library.name))
            })
    }

    // ---------------------------------------------------------------------
    // Running keywords

    /// Run one step: substitute, resolve, call, assign.
    pub(crate) fn run_call(&mut self, call: &KeywordCall) -> KwResult<()> {
        self.check_timeout()?;
        let name = self.vars.replace_string(&call.keyword)?;
        let handler = self.resolve(&name)?;
        let args = self.build_args(&handler, &call.args)?;
        let value = self.invoke(&handler, &name, args)?;
        self.assign(&call.assign, value)
    }

    /// Run a keyword with already resolved arguments (the `Run Keyword` family).
    pub(crate) fn run_keyword(&mut self, name: &str, values: Vec<Value>) -> KwResult {
        self.check_timeout()?;
        let handler = self.resolve(name)?;
        let spec = handler.spec()?;
        let args = values
            .into_iter()
            .map(|value| match &value {
                Value::Str(text) => match split_named(text) {
                    Some((key, rest)) if spec.accepts_named(key) => Arg {
                        name: Some(key.to_string()),
                        value: Value::str(rest),
                    },
                    _ => Arg::positional(value),
                },
                _ => Arg::positional(value),
            })
            .collect();
        self.invoke(&handler, name, args)
    }

    fn build_args(&self, handler: &Handler<'a>, cells: &[String]) -> KwResult<Vec<Arg>> {
        let spec = handler.spec()?;
        let raw = handler.raw_args();
        let mut out = Vec::with_capacity(cells.len());
        for (ix, cell) in cells.iter().enumerate() {
            if ix < raw {
                out.push(Arg::positional(Value::str(cell.as_str())));
                continue;
            }
            match whole_variable(cell).map(|found| found.sigil) {
                Some('@') => {
                    for value in self.vars.replace_list(std::slice::from_ref(cell))? {
                        out.push(Arg::positional(value));
                    }
                    continue;
                }
                Some('&') => {
                    if let Value::Dict(entries) = self.vars.replace_scalar(cell)? {
                        for (key, value) in entries.borrow().iter() {
                            out.push(Arg {
                                name: Some(key.clone()),
                                value: value.clone(),
                            });
                        }
                    }
                    continue;
                }
                _ => {}
            }
            match split_named(cell) {
                Some((key, rest)) if spec.accepts_named(key) => out.push(Arg {
                    name: Some(key.to_string()),
                    value: self.vars.replace_scalar(rest)?,
                }),
                _ => out.push(Arg::positional(self.vars.replace_scalar(cell)?)),
            }
        }
        Ok(out)
    }

    fn invoke(&mut self, handler: &Handler<'a>, name: &str, args: Vec<Arg>) -> KwResult {
        if self.depth >= MAX_DEPTH {
            return Err(Failure::fail(
                "Maximum limit of started keywords exceeded.",
            ));
        }
        tracing::trace!(target: "rfi.runtime", keyword = %name, "keyword started");
        self.depth += 1;
        let result = match handler {
            Handler::User(kw) => self.run_user_keyword(kw, args),
            Handler::Resource(kw) => self.run_user_keyword(kw, args),
            Handler::Library(kw, owner) => self.run_library_keyword(kw, owner, args),
        };
        self.depth -= 1;
        result
    }

    fn run_library_keyword(
        &mut self,
        kw: &LibraryKeyword,
        owner: &str,
        args: Vec<Arg>,
    ) -> KwResult {
        let qualified = format!("{owner}.{}", kw.name);
        let bound = ArgSpec::library(kw.args).bind(&qualified, args)?;
        let values = bound
            .into_iter()
            .map(|bound| match bound {
                Bound::Value(value) => value,
                Bound::Default(text) => library_default(&text),
            })
            .collect();
        let mut args = Args::new(kw.name, values);
        (kw.run)(self, &mut args)
    }

    fn run_user_keyword(&mut self, kw: &UserKeyword, args: Vec<Arg>) -> KwResult {
        let spec = ArgSpec::user(&kw.name, &kw.arguments)?;
        let bound = spec.bind(&kw.name, args)?;

        self.vars.push_frame();
        let timeout = match kw.timeout.as_deref() {
            Some(text) => self.push_deadline("Keyword", text),
            None => Ok(false),
        };
        let pushed = matches!(timeout, Ok(true));
        let result = match timeout {
            Ok(_) => self.run_user_body(kw, &spec, bound),
            Err(failure) => Err(failure),
        };
        if pushed {
            self.deadlines.pop();
        }
        let teardown = match &kw.teardown {
            Some(call) => self.run_call(call),
            None => Ok(()),
        };
        self.vars.pop_frame();

        match (result, teardown) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(failure), Ok(())) => Err(failure),
            (Ok(_), Err(failure)) => Err(Failure {
                kind: failure.kind,
                message: format!("Keyword teardown failed:\n{}", failure.message),
            }),
            (Err(first), Err(second)) => Err(Failure {
                kind: first.kind,
                message: format!(
                    "{}\n\nAlso keyword teardown failed:\n{}",
                    first.message, second.message
                ),
            }),
        }
    }

    fn run_user_body(&mut self, kw: &UserKeyword, spec: &ArgSpec, bound: Vec<Bound>) -> KwResult {
        for (param, bound) in spec.params.iter().zip(bound) {
            let value = match bound {
                Bound::Value(value) => value,
                Bound::Default(text) => self.vars.replace_scalar(&text)?,
            };
            let decorated = match param.kind {
                ParamKind::Positional => format!("${{{}}}", param.name),
                ParamKind::Varargs => format!("@{{{}}}", param.name),
                ParamKind::Kwargs => format!("&{{{}}}", param.name),
            };
            self.vars.set_local(&decorated, &param.name, value);
        }

        for step in &kw.body {
            match step {
                Step::Call(call) => self.run_call(call)?,
                Step::Return { values, .. } => return self.return_value(values),
            }
        }
        if kw.returns.is_empty() {
            Ok(Value::None)
        } else {
            self.return_value(&kw.returns)
        }
    }

    fn return_value(&mut self, cells: &[String]) -> KwResult {
        let mut values = self.vars.replace_list(cells)?;
        Ok(match values.len() {
            0 => Value::None,
            1 => values.remove(0),
            _ => Value::list(values),
        })
    }

    fn assign(&mut self, targets: &[String], value: Value) -> KwResult<()> {
        let targets: Vec<&str> = targets
            .iter()
            .map(|t| t.trim_end_matches('=').trim_end())
            .collect();
        match targets.as_slice() {
            [] => Ok(()),
            [single] => self.assign_one(single, value),
            many => {
                let names = many.join(", ");
                let items = match &value {
                    Value::List(items) => items.borrow().clone(),
                    other => {
                        return Err(Failure::fail(format!(
                            "Cannot set variables {names}: Expected list-like value, got {}.",
                            other.type_name()
                        )))
                    }
                };
                let list_at = many.iter().position(|t| t.starts_with('@'));
                let scalars = many.len() - usize::from(list_at.is_some());
                let count_ok = match list_at {
                    Some(_) => items.len() >= scalars,
                    None => items.len() == scalars,
                };
                if !count_ok {
                    let expected = match list_at {
                        Some(_) => format!("{scalars} or more"),
                        None => scalars.to_string(),
                    };
                    return Err(Failure::fail(format!(
                        "Cannot set variables {names}: Expected {expected} return values, got {}.",
                        items.len()
                    )));
                }
                let mut items = items.into_iter();
                let rest = items.len() - scalars;
                for target in many {
                    let value = if target.starts_with('@') {
                        Value::list(items.by_ref().take(rest).collect())
                    } else {
                        items.next().unwrap_or_default()
                    };
                    self.assign_one(target, value)?;
                }
                Ok(())
            }
        }
    }

    fn assign_one(&mut self, target: &str, value: Value) -> KwResult<()> {
        let Some((sigil, base)) = split_decorated(target) else {
            return Err(Failure::fail(format!("Invalid variable name '{target}'.")));
        };
        let value = match (sigil, value) {
            ('$', value) => value,
            ('@', value @ Value::List(_)) | ('&', value @ Value::Dict(_)) => value,
            (_, other) => {
                let expected = if sigil == '@' { "list" } else { "dictionary" };
                return Err(Failure::fail(format!(
                    "Cannot set variable '{target}': Expected {expected}-like value, got {}.",
                    other.type_name()
                )));
            }
        };
        self.vars.set_local(target, base, value);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Timeouts

    /// Start a timeout; `Ok(false)` when `text` disables it.
    fn push_deadline(&mut self, owner: &'static str, text: &str) -> KwResult<bool> {
        let text = self.vars.replace_string(text)?;
        if text.is_empty() || text.eq_ignore_ascii_case("none") {
            return Ok(false);
        }
        let Some(duration) = parse_time(&text) else {
            return Err(Failure::fail(format!(
                "Setting {} timeout failed: Invalid time string '{text}'.",
                owner.to_lowercase()
            )));
        };
        if duration.is_zero() {
            return Ok(false);
        }
        self.deadlines.push(Deadline {
            at: Instant::now() + duration,
            owner,
            text,
        });
        Ok(true)
    }

    fn check_timeout(&self) -> KwResult<()> {
        let now = Instant::now();
        match self.deadlines.iter().find(|d| now >= d.at) {
            Some(d) => Err(Failure::fail(format!("{} timeout {} exceeded.", d.owner, d.text))),
            None => Ok(()),
        }
    }

    /// Time left before the nearest timeout, if any is active.
    pub(crate) fn remaining_time(&self) -> Option<Duration> {
        let now = Instant::now();
        self.deadlines
            .iter()
            .map(|d| d.at.saturating_duration_since(now))
            .min()
    }

    pub(crate) fn after_sleep(&self) -> KwResult<()> {
        self.check_timeout()
    }

    // ---------------------------------------------------------------------
    // Logging and tags

    pub(crate) fn log(&mut self, level: &str, message: &str) -> KwResult<()> {
        let level = level.trim().to_ascii_uppercase();
        let level = if level == "WARNING" { "WARN".to_string() } else { level };
        let Some(rank) = LOG_LEVELS.iter().position(|l| *l == level) else {
            return Err(Failure::fail(format!("Invalid log level '{level}'.")));
        };
        if matches!(level.as_str(), "WARN" | "ERROR") {
            self.console(&format!("[ {level} ] {message}\n"));
        }
        if rank < self.log_level || level == "NONE" {
            return Ok(());
        }
        match self.test.as_mut() {
            Some(test) => test.messages.push(LogMessage {
                level,
                message: message.to_string(),
            }),
            None => {
                tracing::debug!(target: "rfi.runtime", %level, text = message, "suite log message")
            }
        }
        Ok(())
    }

    pub(crate) fn set_log_level(&mut self, level: &str) -> KwResult<String> {
        let level = level.trim().to_ascii_uppercase();
        let Some(rank) = LOG_LEVELS.iter().position(|l| *l == level) else {
            return Err(Failure::fail(format!("Invalid log level '{level}'.")));
        };
        let old = LOG_LEVELS[self.log_level].to_string();
        self.log_level = rank;
        self.vars.set_builtin("${LOG_LEVEL}", Value::str(level));
        Ok(old)
    }

    pub(crate) fn console(&mut self, text: &str) {
        self.ctx.stdout.write(text, true);
    }

    pub(crate) fn set_tags(&mut self, tags: &[String], remove: bool) -> KwResult<()> {
        let Some(test) = self.test.as_mut() else {
            let verb = if remove { "Remove" } else { "Set" };
            return Err(Failure::fail(format!(
                "'{verb} Tags' cannot be used in suite setup or teardown."
            )));
        };
        if remove {
            test.tags.retain(|tag| !tags.iter().any(|t| same_name(t, tag)));
        } else {
            for tag in tags {
                if !test.tags.iter().any(|t| same_name(t, tag)) {
                    test.tags.push(tag.clone());
                }
            }
        }
        let value = Value::list(test.tags.iter().map(|t| Value::str(t.as_str())).collect());
        self.vars.set_test("@{TEST_TAGS}", "TEST_TAGS", value)
    }

    // ---------------------------------------------------------------------
    // Fixtures and tests

    /// Run a suite setup or teardown in its own frame.
    pub(crate) fn run_fixture(&mut self, call: &KeywordCall) -> KwResult<()> {
        self.vars.push_frame();
        let result = self.run_call(call);
        self.vars.pop_frame();
        result
    }

    pub(crate) fn run_test(&mut self, test: &TestCase) -> TestResult {
        let started = Instant::now();
        let tags_value = Value::list(test.tags.iter().map(|t| Value::str(t.as_str())).collect());
        self.vars.start_test([
            ("${TEST_NAME}", Value::str(test.name.as_str())),
            ("@{TEST_TAGS}", tags_value),
            ("${TEST_DOCUMENTATION}", Value::str(test.documentation.as_str())),
        ]);
        self.vars.push_frame();
        self.test = Some(TestState {
            tags: test.tags.clone(),
            messages: Vec::new(),
        });

        let body = self.run_test_body(test);
        self.deadlines.clear();
        let (mut status, mut message) = match body {
            Ok(()) => (Status::Pass, String::new()),
            Err(failure) => match failure.kind {
                FailureKind::Pass => (Status::Pass, failure.message),
                FailureKind::Skip => (Status::Skip, failure.message),
                FailureKind::Fail => (Status::Fail, failure.message),
                FailureKind::Fatal => {
                    self.fatal = true;
                    (Status::Fail, failure.message)
                }
            },
        };

        if let Some(teardown) = &test.teardown {
            self.vars.set_test_builtins([
                ("${TEST_STATUS}", Value::str(status.as_str())),
                ("${TEST_MESSAGE}", Value::str(message.as_str())),
            ]);
            if let Err(failure) = self.run_call(teardown) {
                if failure.kind == FailureKind::Fatal {
                    self.fatal = true;
                }
                match (failure.kind, status) {
                    (FailureKind::Pass, _) => {}
                    (FailureKind::Skip, Status::Pass) => {
                        status = Status::Skip;
                        message = failure.message;
                    }
                    (_, Status::Fail) => {
                        message =
                            format!("{message}\n\nAlso teardown failed:\n{}", failure.message);
                    }
                    _ => {
                        status = Status::Fail;
                        message = format!("Teardown failed:\n{}", failure.message);
                    }
                }
            }
        }

        let state = self.test.take();
        self.vars.end_test();
        self.vars
            .set_builtin("${PREV_TEST_NAME}", Value::str(test.name.as_str()));
        self.vars
            .set_builtin("${PREV_TEST_STATUS}", Value::str(status.as_str()));
        self.vars
            .set_builtin("${PREV_TEST_MESSAGE}", Value::str(message.as_str()));

        let (tags, messages) = state.map_or_else(Default::default, |s| (s.tags, s.messages));
        TestResult {
            name: test.name.clone(),
            status,
            message,
            tags,
            elapsed_ms: elapsed_ms(started),
            messages,
        }
    }

    fn run_test_body(&mut self, test: &TestCase) -> KwResult<()> {
        if let Some(timeout) = &test.timeout {
            self.push_deadline("Test", timeout)?;
        }
        if let Some(setup) = &test.setup {
            self.run_call(setup).map_err(|failure| match failure.kind {
                FailureKind::Fail | FailureKind::Fatal => Failure {
                    kind: failure.kind,
                    message: format!("Setup failed:\n{}", failure.message),
                },
                _ => failure,
            })?;
        }
        for call in &test.body {
            self.run_call(call)?;
        }
        Ok(())
    }
}

fn ambiguous(name: &str, owners: impl Iterator<Item = String>) -> Failure {
    let mut owners: Vec<String> = owners.collect();
    owners.sort();
    Failure::fail(format!(
        "Multiple keywords with name '{name}' found. Give the full name of the keyword you \
         want to use:\n    {}",
        owners.join("\n    ")
    ))
}

/// Split `name=value` at the first unescaped `=`.
fn split_named(cell: &str) -> Option<(&str, &str)> {
    let bytes = cell.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'=' if i > 0 => return Some((&cell[..i], &cell[i + 1..])),
            b'=' => return None,
            _ => i += 1,
        }
    }
    None
}

fn library_default(text: &str) -> Value {
    match text {
        "None" => Value::None,
        "True" => Value::Bool(true),
        "False" => Value::Bool(false),
        other => Value::str(other),
    }
}

pub(crate) fn user_keyword_spec(kw: &UserKeyword) -> KeywordSpec {
    KeywordSpec {
        name: kw.name.clone(),
        args: kw.arguments.clone(),
        doc: kw.documentation.clone(),
        tags: kw.tags.clone(),
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
