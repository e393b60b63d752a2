//! Structural model of a parsed snippet.

/// Whether runnable units are tests or tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    Tests,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Settings,
    Variables,
    TestCases,
    Tasks,
    Keywords,
    Comments,
}

impl SectionKind {
    pub(crate) fn from_header(name: &str) -> Option<Self> {
        Some(match name {
            "settings" | "setting" => SectionKind::Settings,
            "variables" | "variable" => SectionKind::Variables,
            "test cases" | "test case" => SectionKind::TestCases,
            "tasks" | "task" => SectionKind::Tasks,
            "keywords" | "keyword" => SectionKind::Keywords,
            "comments" | "comment" => SectionKind::Comments,
            _ => return None,
        })
    }

    /// Run mode implied by this section, for runnable sections only.
    pub fn run_mode(self) -> Option<RunMode> {
        match self {
            SectionKind::TestCases => Some(RunMode::Tests),
            SectionKind::Tasks => Some(RunMode::Tasks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    /// 1-based line of the header.
    pub line: u32,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Settings(Vec<Setting>),
    Variables(Vec<VariableDef>),
    /// Tests or tasks, depending on [`Section::kind`].
    Tests(Vec<Block>),
    Keywords(Vec<Block>),
    Comments,
}

/// Suite level settings. Task aliases map onto their test counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Documentation,
    Metadata,
    SuiteSetup,
    SuiteTeardown,
    TestSetup,
    TestTeardown,
    TestTimeout,
    TestTags,
    DefaultTags,
    KeywordTags,
    Library,
    Resource,
    Variables,
}

impl SettingKind {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        Some(match normalized.as_str() {
            "documentation" => SettingKind::Documentation,
            "metadata" => SettingKind::Metadata,
            "suite setup" => SettingKind::SuiteSetup,
            "suite teardown" => SettingKind::SuiteTeardown,
            "test setup" | "task setup" => SettingKind::TestSetup,
            "test teardown" | "task teardown" => SettingKind::TestTeardown,
            "test timeout" | "task timeout" => SettingKind::TestTimeout,
            "test tags" | "task tags" | "force tags" => SettingKind::TestTags,
            "default tags" => SettingKind::DefaultTags,
            "keyword tags" => SettingKind::KeywordTags,
            "library" => SettingKind::Library,
            "resource" => SettingKind::Resource,
            "variables" => SettingKind::Variables,
            _ => return None,
        })
    }

    pub fn requires_value(self) -> bool {
        matches!(
            self,
            SettingKind::Metadata
                | SettingKind::Library
                | SettingKind::Resource
                | SettingKind::Variables
        )
    }

    pub fn is_fixture(self) -> bool {
        matches!(
            self,
            SettingKind::SuiteSetup
                | SettingKind::SuiteTeardown
                | SettingKind::TestSetup
                | SettingKind::TestTeardown
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub kind: SettingKind,
    /// The setting name as written.
    pub name: String,
    pub values: Vec<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDef {
    /// Decorated name without a trailing `=`, e.g. `${HOST}`.
    pub name: String,
    pub values: Vec<String>,
    pub line: u32,
}

/// A test, task, or user keyword definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub line: u32,
    pub settings: Vec<BlockSetting>,
    pub body: Vec<Step>,
}

impl Block {
    pub fn setting(&self, kind: BlockSettingKind) -> Option<&BlockSetting> {
        self.settings.iter().rev().find(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSettingKind {
    Documentation,
    Tags,
    Setup,
    Teardown,
    Timeout,
    Arguments,
    Return,
}

impl BlockSettingKind {
    pub(crate) fn lookup(name: &str, keyword: bool) -> Option<Self> {
        let normalized = name.split_whitespace().collect::<String>().to_lowercase();
        let kind = match normalized.as_str() {
            "documentation" => BlockSettingKind::Documentation,
            "tags" => BlockSettingKind::Tags,
            "teardown" => BlockSettingKind::Teardown,
            "timeout" => BlockSettingKind::Timeout,
            "setup" if !keyword => BlockSettingKind::Setup,
            "arguments" if keyword => BlockSettingKind::Arguments,
            "return" if keyword => BlockSettingKind::Return,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSetting {
    pub kind: BlockSettingKind,
    pub values: Vec<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Call(KeywordCall),
    Return { values: Vec<String>, line: u32 },
}

/// `${a}    ${b}=    Keyword Name    arg1    arg2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCall {
    pub assign: Vec<String>,
    pub keyword: String,
    pub args: Vec<String>,
    pub line: u32,
}

impl KeywordCall {
    /// Build a call from setting values (`[Setup]    Keyword    arg`).
    ///
    /// Returns `None` for an empty value or the explicit `NONE` marker.
    pub fn from_values(values: &[String], line: u32) -> Option<Self> {
        let (keyword, args) = values.split_first()?;
        if keyword.is_empty() || keyword.eq_ignore_ascii_case("none") {
            return None;
        }
        Some(Self {
            assign: Vec::new(),
            keyword: keyword.clone(),
            args: args.to_vec(),
            line,
        })
    }
}
