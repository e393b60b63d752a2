use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::ReentrantMutex;
use thiserror::Error;

mod logging;

pub use logging::init_tracing;

/// Default cap on completion matches.
pub const DEFAULT_COMPLETION_LIMIT: usize = 200;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Session configuration.
///
/// Loaded from TOML:
///
/// ```toml
/// [logging]
/// level = "debug"
/// json = false
///
/// [completion]
/// extra_libraries = ["SeleniumLibrary"]
/// limit = 100
///
/// [execution]
/// suite_name = "Notebook"
/// output_root = "/tmp/rfi"
/// ```
pub struct RfiConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level for all rfi crates, or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path.
    ///
    /// If the file cannot be opened, file logging is disabled while other sinks
    /// remain active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective `EnvFilter`: [`LoggingConfig::level`] merged with
    /// `RUST_LOG` when that is set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// Library names offered on import lines besides the standard libraries.
    #[serde(default)]
    pub extra_libraries: Vec<String>,

    /// Maximum number of keyword matches per request.
    #[serde(default = "CompletionConfig::default_limit")]
    pub limit: usize,
}

impl CompletionConfig {
    fn default_limit() -> usize {
        DEFAULT_COMPLETION_LIMIT
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            extra_libraries: Vec::new(),
            limit: Self::default_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Name of the session suite.
    #[serde(default = "ExecutionConfig::default_suite_name")]
    pub suite_name: String,

    /// Directory cell paths resolve against; the workspace root when unset.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,

    /// Parent of per-run output directories; the system temp dir when unset.
    #[serde(default)]
    pub output_root: Option<PathBuf>,
}

impl ExecutionConfig {
    fn default_suite_name() -> String {
        "Jupyter".to_owned()
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            suite_name: Self::default_suite_name(),
            source_dir: None,
            output_root: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

/// Redact quoted and backticked user values from a TOML/serde message.
fn sanitize_toml_error_message(message: &str) -> String {
    static QUOTED_STRING_RE: OnceLock<regex::Regex> = OnceLock::new();
    static SINGLE_QUOTED_STRING_RE: OnceLock<regex::Regex> = OnceLock::new();

    // Escaped quotes (`\"`) may appear inside the quoted substring.
    let re = QUOTED_STRING_RE.get_or_init(|| {
        regex::Regex::new(r#""(?:\\.|[^"\\])*""#).expect("quoted-string regex should compile")
    });
    let mut out = re.replace_all(message, r#""<redacted>""#).into_owned();

    let re_single = SINGLE_QUOTED_STRING_RE.get_or_init(|| {
        regex::Regex::new(r#"'(?:\\.|[^'\\])*'"#)
            .expect("single-quoted-string regex should compile")
    });
    out = re_single.replace_all(&out, "'<redacted>'").into_owned();

    // `unknown field `x`, expected ...` and `invalid type: integer `1`` carry
    // user input in backticks; `missing field `x`` names a schema field.
    let mut start = ["unknown field `", "unknown variant `"]
        .iter()
        .filter_map(|pattern| out.find(pattern).map(|pos| pos + pattern.len() - 1))
        .min();
    if start.is_none() && (out.contains("invalid type:") || out.contains("invalid value:")) {
        let boundary = out.find(", expected").unwrap_or(out.len());
        start = out[..boundary].find('`');
    }
    if let Some(start) = start {
        let after_start = &out[start + 1..];
        let end_rel = after_start
            .find("`, expected")
            .or_else(|| after_start.find('`'));
        if let Some(end_rel) = end_rel {
            let end = start + 1 + end_rel;
            out.replace_range(start + 1..end, "<redacted>");
        }
    }

    out
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` includes a source snippet; keep only the message.
        ConfigError::Toml(sanitize_toml_error_message(err.message()))
    }
}

impl RfiConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }
}

pub const RFI_CONFIG_ENV_VAR: &str = "RFI_CONFIG_PATH";

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `f` while holding the config environment lock.
///
/// Tests that set [`RFI_CONFIG_ENV_VAR`] wrap the mutation and the discovery
/// in this so concurrent discovery never observes the override.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Discover the configuration file for a workspace root.
///
/// Search order:
/// 1) `RFI_CONFIG_PATH` (absolute or relative to `workspace_root`)
/// 2) `rfi.toml` in `workspace_root`
/// 3) `.rfi.toml` in `workspace_root`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(RFI_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    ["rfi.toml", ".rfi.toml"]
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the configuration for a workspace root.
///
/// If no config is present, returns [`RfiConfig::default`] and `None`.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(RfiConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((RfiConfig::default(), None));
    };

    let config = RfiConfig::load_from_path(&path)?;
    tracing::debug!(target: "rfi.config", path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}
