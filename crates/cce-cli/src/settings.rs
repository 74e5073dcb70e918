//! Layered settings for `cce-forge`.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables prefixed `CCE__`, nested with `__`
//!    (e.g. `CCE__ENGINE__CODEBOOK__SEED=7`)
//!
//! Command-line flags are applied on top by the binary.

use std::path::Path;

use cce_core::{CceError, CceResult, EngineConfig};
use serde::{Deserialize, Serialize};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CCE";

/// Separator between prefix and nested keys.
pub const ENV_SEPARATOR: &str = "__";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> CceResult<()> {
        if !LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(CceError::validation(
                "logging.level",
                format!("must be one of {:?}, got '{}'", LOG_LEVELS, self.level),
            ));
        }
        Ok(())
    }

    /// The level as a `tracing` level.
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }
}

/// Everything the binary reads from configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

fn config_error(err: config::ConfigError) -> CceError {
    CceError::ConfigError(err.to_string())
}

impl Settings {
    /// Load settings from defaults, `file` and the process environment.
    pub fn load(file: Option<&Path>) -> CceResult<Self> {
        Self::load_from(file, None)
    }

    /// Like [`Settings::load`], with an explicit environment map in place
    /// of the process environment when `env` is given.
    pub fn load_from(file: Option<&Path>, env: Option<config::Map<String, String>>) -> CceResult<Self> {
        let defaults = config::Config::try_from(&Settings::default()).map_err(config_error)?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CceResult<()> {
        self.logging.validate()?;
        self.engine.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.engine, EngineConfig::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_log_level_validation() {
        let bad = LoggingConfig {
            level: "loud".to_string(),
        };
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));

        let upper = LoggingConfig {
            level: "DEBUG".to_string(),
        };
        assert!(upper.validate().is_ok());
        assert_eq!(upper.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_load_without_sources_gives_defaults() {
        let settings = Settings::load_from(None, Some(config::Map::new())).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
