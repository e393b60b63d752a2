use std::ffi::OsString;

use pretty_assertions::assert_eq;
use rfi_config::{
    discover_config_path, load_for_workspace, with_config_env_lock, ConfigError, RfiConfig,
    RFI_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: impl Into<OsString>) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value.into());
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_rfi_toml_in_workspace_root() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(RFI_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("rfi.toml");
        std::fs::write(&config_path, "[completion]\nlimit = 5\n").unwrap();

        let discovered = discover_config_path(dir.path())
            .expect("rfi.toml should be discovered when present in workspace root");
        assert_eq!(discovered, config_path.canonicalize().unwrap_or(config_path));
    });
}

#[test]
fn hidden_config_is_a_fallback() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(RFI_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let hidden = dir.path().join(".rfi.toml");
        std::fs::write(&hidden, "[execution]\nsuite_name = \"Hidden\"\n").unwrap();

        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(config.execution.suite_name, "Hidden");
        assert_eq!(path, Some(hidden.canonicalize().unwrap_or(hidden.clone())));

        std::fs::write(dir.path().join("rfi.toml"), "[execution]\nsuite_name = \"Plain\"\n")
            .unwrap();
        let (config, _) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(config.execution.suite_name, "Plain");
    });
}

#[test]
fn env_override_wins_over_workspace_file() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("rfi.toml"), "[completion]\nlimit = 1\n").unwrap();

        let override_path = dir.path().join("override.toml");
        std::fs::write(&override_path, "[completion]\nlimit = 2\n").unwrap();

        let _env = EnvVarGuard::set(RFI_CONFIG_ENV_VAR, "override.toml");
        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(config.completion.limit, 2);
        assert_eq!(
            path.expect("load_for_workspace should return the resolved config path"),
            override_path.canonicalize().unwrap_or(override_path)
        );
    });
}

#[test]
fn missing_config_returns_defaults() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(RFI_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(config, RfiConfig::default());
        assert_eq!(path, None);
    });
}

#[test]
fn missing_override_file_is_an_io_error() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        let _env = EnvVarGuard::set(RFI_CONFIG_ENV_VAR, dir.path().join("nope.toml"));

        let err = load_for_workspace(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err:?}");
    });
}
