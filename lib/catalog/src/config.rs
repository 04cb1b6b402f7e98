//! Storage configuration.
//!
//! Loaded via the `config` crate from environment variables prefixed with
//! `PANTRY_STORE__`, e.g. `PANTRY_STORE__DATABASE_URL`.

use serde::Deserialize;

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl StoreConfig {
    /// Creates a configuration with the default pool size.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: default_max_connections(),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL is missing or a value fails to
    /// parse.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("PANTRY_STORE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
