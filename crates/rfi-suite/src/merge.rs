use crate::model::{
    timeout_value, Import, ImportKind, TestCase, TestDefaults, UserKeyword, Variable,
};
use crate::Suite;
use rfi_syntax::{KeywordCall, ModeConflict, ParseError, RunMode, SettingKind, SnippetModel};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Structural problems found while parsing a snippet. The suite is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render_diagnostics(.path, .errors))]
pub struct CompileError {
    pub path: PathBuf,
    pub errors: Vec<ParseError>,
}

fn render_diagnostics(path: &Path, errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|err| {
            format!(
                "Error in file '{}' on line {}: {}",
                path.display(),
                err.line,
                err.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    ModeConflict(#[from] ModeConflict),
}

/// What a successful [`merge`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Run mode of the snippet; `None` when it has no tests or tasks.
    pub run_mode: Option<RunMode>,
    /// Names of tests the snippet added that the suite did not hold before.
    pub new_tests: Vec<String>,
    /// Entries dropped because a later definition reused their name.
    pub collapsed: usize,
}

/// Parse `text` and fold its declarations and tests into `suite`.
///
/// Fails before touching the suite when the snippet has parse diagnostics or
/// mixes tests and tasks. Settings that apply to tests are recorded in
/// `defaults` and picked up by the snippet's own tests.
pub fn merge(
    text: &str,
    suite: &mut Suite,
    defaults: &mut TestDefaults,
) -> Result<MergeOutcome, MergeError> {
    let model = rfi_syntax::parse(text);
    if model.has_errors() {
        return Err(CompileError {
            path: suite.source.clone(),
            errors: model.errors,
        }
        .into());
    }
    let run_mode = model.run_mode()?;

    let existing: HashSet<String> = suite.tests.names().map(str::to_string).collect();

    apply_settings(&model, suite, defaults);

    suite.variables.extend(model.variables().map(|def| Variable {
        name: def.name.clone(),
        values: def.values.clone(),
        line: def.line,
    }));
    let keyword_tags = defaults.keyword_tags.as_slice();
    suite.keywords.extend(
        model
            .keywords()
            .map(|block| UserKeyword::from_block(block, keyword_tags)),
    );
    suite
        .tests
        .extend(model.tests().map(|block| TestCase::from_block(block, defaults)));

    let collapsed = suite.imports.dedup_by_name()
        + suite.variables.dedup_by_name()
        + suite.keywords.dedup_by_name()
        + suite.tests.dedup_by_name();

    let mut seen = HashSet::new();
    let new_tests: Vec<String> = model
        .tests()
        .filter(|block| !existing.contains(&block.name) && seen.insert(block.name.as_str()))
        .map(|block| block.name.clone())
        .collect();

    tracing::debug!(
        target: "rfi.suite",
        suite = %suite.name,
        imports = suite.imports.len(),
        variables = suite.variables.len(),
        keywords = suite.keywords.len(),
        new_tests = new_tests.len(),
        collapsed,
        "merged snippet"
    );

    Ok(MergeOutcome {
        run_mode,
        new_tests,
        collapsed,
    })
}

fn apply_settings(model: &SnippetModel, suite: &mut Suite, defaults: &mut TestDefaults) {
    for setting in model.settings() {
        let values = &setting.values;
        let line = setting.line;
        match setting.kind {
            SettingKind::Documentation => suite.settings.documentation = values.join(" "),
            SettingKind::Metadata => {
                let Some((name, rest)) = values.split_first() else {
                    continue;
                };
                let value = rest.join(" ");
                let metadata = &mut suite.settings.metadata;
                match metadata.iter_mut().find(|(existing, _)| existing == name) {
                    Some(entry) => entry.1 = value,
                    None => metadata.push((name.clone(), value)),
                }
            }
            SettingKind::SuiteSetup => {
                suite.settings.setup = KeywordCall::from_values(values, line);
            }
            SettingKind::SuiteTeardown => {
                suite.settings.teardown = KeywordCall::from_values(values, line);
            }
            SettingKind::TestSetup => defaults.setup = KeywordCall::from_values(values, line),
            SettingKind::TestTeardown => {
                defaults.teardown = KeywordCall::from_values(values, line);
            }
            SettingKind::TestTimeout => defaults.timeout = timeout_value(values),
            SettingKind::TestTags => defaults.force_tags.extend(values.iter().cloned()),
            SettingKind::DefaultTags => defaults.default_tags = values.clone(),
            SettingKind::KeywordTags => defaults.keyword_tags.extend(values.iter().cloned()),
            SettingKind::Library => suite.imports.push(Import::library(values, line)),
            SettingKind::Resource | SettingKind::Variables => {
                let kind = if setting.kind == SettingKind::Resource {
                    ImportKind::Resource
                } else {
                    ImportKind::Variables
                };
                let (name, args) = values.split_first().map_or_else(
                    || (String::new(), Vec::new()),
                    |(name, args)| (name.clone(), args.to_vec()),
                );
                suite.imports.push(Import {
                    kind,
                    name,
                    args,
                    alias: None,
                    line,
                });
            }
        }
    }
}
