use rfi_core::Named;
use rfi_syntax::{Block, BlockSettingKind, KeywordCall, Step};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Library,
    Resource,
    Variables,
}

/// A `Library`, `Resource` or `Variables` import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub kind: ImportKind,
    pub name: String,
    pub args: Vec<String>,
    /// `Library    Name    AS    Alias`
    pub alias: Option<String>,
    pub line: u32,
}

impl Import {
    /// Split `Library` values into name, arguments and alias.
    pub fn library(values: &[String], line: u32) -> Self {
        let (name, rest): (&str, &[String]) = values
            .split_first()
            .map_or(("", &[]), |(name, rest)| (name.as_str(), rest));
        let marker = rest.iter().position(|v| v == "AS" || v == "WITH NAME");
        let (args, alias) = match marker {
            Some(ix) => (&rest[..ix], rest.get(ix + 1).cloned()),
            None => (rest, None),
        };
        Self {
            kind: ImportKind::Library,
            name: name.to_string(),
            args: args.to_vec(),
            alias,
            line,
        }
    }

    /// The name keywords from this import are qualified with.
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl Named for Import {
    fn name(&self) -> &str {
        self.effective_name()
    }
}

/// A suite level variable, e.g. `${HOST}    example.org`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Decorated name: `${HOST}`, `@{ITEMS}`, `&{MAP}`.
    pub name: String,
    pub values: Vec<String>,
    pub line: u32,
}

impl Named for Variable {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A user keyword defined in a `*** Keywords ***` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKeyword {
    pub name: String,
    pub documentation: String,
    /// `${name}` or `${name}=default`.
    pub arguments: Vec<String>,
    pub tags: Vec<String>,
    pub body: Vec<Step>,
    /// Values from a `[Return]` setting.
    pub returns: Vec<String>,
    pub teardown: Option<KeywordCall>,
    pub timeout: Option<String>,
    pub line: u32,
}

impl Named for UserKeyword {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A test or task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub documentation: String,
    pub tags: Vec<String>,
    pub setup: Option<KeywordCall>,
    pub teardown: Option<KeywordCall>,
    pub timeout: Option<String>,
    pub body: Vec<KeywordCall>,
    pub line: u32,
}

impl Named for TestCase {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Defaults applied to the tests of one snippet.
///
/// Built fresh for every execution; a snippet's `Test Setup` or `Test Tags`
/// never leaks into a later cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestDefaults {
    pub setup: Option<KeywordCall>,
    pub teardown: Option<KeywordCall>,
    pub timeout: Option<String>,
    /// `Test Tags` / `Force Tags`, added to every test.
    pub force_tags: Vec<String>,
    /// Used when a test has no `[Tags]` of its own.
    pub default_tags: Vec<String>,
    /// `Keyword Tags`, added to every user keyword.
    pub keyword_tags: Vec<String>,
}

pub(crate) fn timeout_value(values: &[String]) -> Option<String> {
    values
        .first()
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
        .cloned()
}

fn block_values(block: &Block, kind: BlockSettingKind) -> Option<&[String]> {
    block.setting(kind).map(|s| s.values.as_slice())
}

fn merge_tags(groups: &[&[String]]) -> Vec<String> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .flat_map(|group| group.iter())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .cloned()
        .collect()
}

fn fixture(
    block: &Block,
    kind: BlockSettingKind,
    fallback: &Option<KeywordCall>,
) -> Option<KeywordCall> {
    match block.setting(kind) {
        Some(setting) => KeywordCall::from_values(&setting.values, setting.line),
        None => fallback.clone(),
    }
}

impl TestCase {
    /// Build a test from its parsed block, filling gaps from `defaults`.
    pub fn from_block(block: &Block, defaults: &TestDefaults) -> Self {
        let own_tags = block_values(block, BlockSettingKind::Tags)
            .unwrap_or(defaults.default_tags.as_slice());
        TestCase {
            name: block.name.clone(),
            documentation: block_values(block, BlockSettingKind::Documentation)
                .map(|v| v.join(" "))
                .unwrap_or_default(),
            tags: merge_tags(&[defaults.force_tags.as_slice(), own_tags]),
            setup: fixture(block, BlockSettingKind::Setup, &defaults.setup),
            teardown: fixture(block, BlockSettingKind::Teardown, &defaults.teardown),
            timeout: match block_values(block, BlockSettingKind::Timeout) {
                Some(values) => timeout_value(values),
                None => defaults.timeout.clone(),
            },
            body: block
                .body
                .iter()
                .filter_map(|step| match step {
                    Step::Call(call) => Some(call.clone()),
                    Step::Return { .. } => None,
                })
                .collect(),
            line: block.line,
        }
    }
}

impl UserKeyword {
    /// Build a keyword from its parsed block; `keyword_tags` come from `Keyword Tags`.
    pub fn from_block(block: &Block, keyword_tags: &[String]) -> Self {
        let own_tags = block_values(block, BlockSettingKind::Tags).unwrap_or_default();
        UserKeyword {
            name: block.name.clone(),
            documentation: block_values(block, BlockSettingKind::Documentation)
                .map(|v| v.join(" "))
                .unwrap_or_default(),
            arguments: block_values(block, BlockSettingKind::Arguments)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            tags: merge_tags(&[keyword_tags, own_tags]),
            body: block.body.clone(),
            returns: block_values(block, BlockSettingKind::Return)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            teardown: fixture(block, BlockSettingKind::Teardown, &None),
            timeout: block_values(block, BlockSettingKind::Timeout).and_then(timeout_value),
            line: block.line,
        }
    }
}
