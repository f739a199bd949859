//! Application settings.
//!
//! Settings come from a TOML file (`config.toml` by default, or the path in
//! `TAQUIZA_CONFIG`). Every key is optional and a missing file simply yields the defaults.
//! `DATABASE_URL` in the environment (or `.env`) overrides the configured database URL.

use crate::{
    core::sentiment::ScorerKind,
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the order database, created on first run.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://taquizas.sqlite?mode=rwc";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Root of config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[database]` table
    pub database: DatabaseSettings,
    /// `[analytics]` table
    pub analytics: AnalyticsSettings,
}

/// Connection settings for the order database
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// sea-orm connection URL
    pub url: String,
    /// Upper bound on pooled connections; the application is single-user
    pub max_connections: u32,
    /// How long an operation waits for a free connection before failing
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 1,
            acquire_timeout_secs: 5,
        }
    }
}

/// Knobs for the analytics collaborators
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Number of months the demand forecast projects
    pub forecast_horizon: usize,
    /// Compound score magnitude at which a comment stops being neutral
    pub sentiment_threshold: f64,
    /// `"vader"` (default) or `"lexicon"` for mostly Spanish comments
    pub sentiment_scorer: ScorerKind,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            forecast_horizon: 12,
            sentiment_threshold: 0.05,
            sentiment_scorer: ScorerKind::Vader,
        }
    }
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from `path`; a file that does not exist yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No settings file found, using defaults");
        return Ok(AppConfig::default());
    }

    debug!(path = %path.display(), "Loading settings");
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads the settings file named by `TAQUIZA_CONFIG` (default `config.toml`) and applies
/// the `DATABASE_URL` override.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path =
        std::env::var("TAQUIZA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config(&path)?;

    if let Ok(url) = std::env::var("DATABASE_URL") {
        debug!("DATABASE_URL overrides the configured database");
        config.database.url = url;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.database.max_connections == 0 {
        return Err(Error::Config {
            message: "database.max_connections must be at least 1".to_string(),
        });
    }
    if !config.analytics.sentiment_threshold.is_finite()
        || config.analytics.sentiment_threshold < 0.0
    {
        return Err(Error::Config {
            message: "analytics.sentiment_threshold must be a non-negative number".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [database]
            url = "sqlite://orders.sqlite?mode=rwc"
            max_connections = 2
            acquire_timeout_secs = 3

            [analytics]
            forecast_horizon = 6
            sentiment_threshold = 0.1
            sentiment_scorer = "lexicon"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.database.url, "sqlite://orders.sqlite?mode=rwc");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.acquire_timeout_secs, 3);
        assert_eq!(config.analytics.forecast_horizon, 6);
        assert_eq!(config.analytics.sentiment_threshold, 0.1);
        assert_eq!(config.analytics.sentiment_scorer, ScorerKind::Lexicon);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config("[analytics]\nforecast_horizon = 3\n").unwrap();
        assert_eq!(config.database, DatabaseSettings::default());
        assert_eq!(config.analytics.forecast_horizon, 3);
        assert_eq!(config.analytics.sentiment_threshold, 0.05);
        assert_eq!(config.analytics.sentiment_scorer, ScorerKind::Vader);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[database\nurl = ");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nurl = \"sqlite::memory:\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
    }

    #[test]
    fn test_unknown_scorer_is_config_error() {
        let result = parse_config("[analytics]\nsentiment_scorer = \"magic\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_connections() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(validate(&config), Err(Error::Config { .. })));
    }
}
