/// Database connection and table creation
pub mod database;

/// Application settings loaded from config.toml and the environment
pub mod settings;

pub use settings::{AnalyticsSettings, AppConfig, DatabaseSettings, load_app_configuration};
