//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file named by `KEYSTONE_CONFIG`) when present, then applies
//! `KEYSTONE_ENV`, `KEYSTONE_LOG_LEVEL` and `KEYSTONE_SECRET_KEY`.
//! Every setting has a default, so running with no file and no env is valid.

use std::{
    env,
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::error::{AppError, ConfigurationMeta};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

pub const ENV_CONFIG_PATH: &str = "KEYSTONE_CONFIG";
pub const ENV_ENVIRONMENT: &str = "KEYSTONE_ENV";
pub const ENV_LOG_LEVEL: &str = "KEYSTONE_LOG_LEVEL";
pub const ENV_SECRET_KEY: &str = "KEYSTONE_SECRET_KEY";

/// Deployment environment the process runs in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
    /// Any other name, kept verbatim.
    Other(String),
}

impl Environment {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "development" | "dev" => Self::Development,
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
            Self::Other(name) => name,
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity threshold, most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [Self::Error, Self::Warn, Self::Info, Self::Debug];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Parse leniently: unknown or empty values resolve to [`LogLevel::Info`].
    pub fn parse_or_default(level: &str) -> Self {
        level.parse().unwrap_or_default()
    }
}

impl FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| {
                AppError::configuration(
                    format!("unrecognised log level: '{s}'"),
                    ConfigurationMeta::key("log_level")
                        .with_expected("error | warn | info | debug")
                        .with_actual(s),
                )
            })
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub environment: Environment,
    /// From `KEYSTONE_SECRET_KEY` only, never sourced from TOML.
    pub secret_key: Option<String>,
    pub log_level: LogLevel,
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn is_test(&self) -> bool {
        self.environment == Environment::Test
    }
}

/// Env-var values, captured once so tests can pass them directly.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub environment: Option<String>,
    pub log_level: Option<String>,
    pub secret_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            environment: env::var(ENV_ENVIRONMENT).ok(),
            log_level: env::var(ENV_LOG_LEVEL).ok(),
            secret_key: env::var(ENV_SECRET_KEY).ok().filter(|s| !s.is_empty()),
        }
    }
}

/// Raw TOML shape: `serde` target before resolution.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    app: RawApp,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawApp {
    environment: Option<String>,
    log_level: Option<String>,
}

/// Load config from the default (or `KEYSTONE_CONFIG`) path, then apply
/// env-var overrides.
pub fn load() -> Result<AppConfig, AppError> {
    let overrides = EnvOverrides::from_env();
    match env::var(ENV_CONFIG_PATH) {
        // An explicitly named file must exist.
        Ok(path) => load_from(Some(&expand_home(&path)), &overrides),
        Err(_) => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            load_from(default.exists().then_some(default), &overrides)
        }
    }
}

/// Internal loader: accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: Option<&Path>, overrides: &EnvOverrides) -> Result<AppConfig, AppError> {
    let raw = match path {
        Some(path) => read_raw(path)?,
        None => RawConfig::default(),
    };

    let environment = overrides
        .environment
        .as_deref()
        .or(raw.app.environment.as_deref())
        .map(Environment::parse)
        .unwrap_or_default();

    let log_level = overrides
        .log_level
        .as_deref()
        .or(raw.app.log_level.as_deref())
        .map(LogLevel::parse_or_default)
        .unwrap_or_default();

    Ok(AppConfig {
        environment,
        secret_key: overrides.secret_key.clone(),
        log_level,
    })
}

fn read_raw(path: &Path) -> Result<RawConfig, AppError> {
    let meta = || ConfigurationMeta::key("config_path").with_actual(path.display().to_string());

    let text = fs::read_to_string(path).map_err(|e| {
        AppError::with_cause(format!("cannot read {}: {e}", path.display()), meta(), e)
    })?;

    toml::from_str(&text).map_err(|e| {
        AppError::with_cause(format!("parse error in {}: {e}", path.display()), meta(), e)
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ErrorMetadata};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[app]
environment = "production"
log_level = "warn"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = load_from(None, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert!(cfg.secret_key.is_none());
        assert!(cfg.is_development());
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(Some(f.path()), &EnvOverrides::default()).unwrap();
        assert!(cfg.is_production());
        assert_eq!(cfg.log_level, LogLevel::Warn);
    }

    #[test]
    fn env_overrides_file() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides {
            environment: Some("test".into()),
            log_level: Some("DEBUG".into()),
            secret_key: Some("s3cret".into()),
        };
        let cfg = load_from(Some(f.path()), &overrides).unwrap();
        assert!(cfg.is_test());
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.secret_key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn invalid_log_level_falls_back_to_info() {
        let overrides = EnvOverrides { log_level: Some("verbose".into()), ..Default::default() };
        let cfg = load_from(None, &overrides).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Info);
    }

    #[test]
    fn unknown_environment_kept_verbatim() {
        let overrides = EnvOverrides { environment: Some("staging".into()), ..Default::default() };
        let cfg = load_from(None, &overrides).unwrap();
        assert_eq!(cfg.environment, Environment::Other("staging".into()));
        assert!(!cfg.is_development() && !cfg.is_production() && !cfg.is_test());
    }

    #[test]
    fn missing_file_errors() {
        let err = load_from(Some(Path::new("/nonexistent/config.toml")), &EnvOverrides::default())
            .unwrap_err();
        assert!(err.is_type(ErrorKind::Configuration));
        assert!(err.message().contains("cannot read"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_file_errors() {
        let f = write_toml("[app]\nlog_level = 3\n");
        let err = load_from(Some(f.path()), &EnvOverrides::default()).unwrap_err();
        assert!(err.is_type(ErrorKind::Configuration));
        assert!(err.message().contains("parse error"));
        match err.metadata() {
            ErrorMetadata::Configuration(meta) => assert_eq!(meta.key, "config_path"),
            other => panic!("unexpected metadata: {other:?}"),
        }
    }

    #[test]
    fn strict_log_level_parse() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        let err = "loud".parse::<LogLevel>().unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.message().contains("loud"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.keystone.toml");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".keystone.toml"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}
