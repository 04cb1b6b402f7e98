//! Bearer token configuration.
//!
//! Loaded via the `config` crate from environment variables prefixed with
//! `PANTRY_AUTH__`, e.g. `PANTRY_AUTH__TOKEN_SECRET`.

use chrono::Duration;
use serde::{Deserialize, Deserializer};

/// Configuration for signing and verifying bearer tokens.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret.
    token_secret: String,
    /// Token lifetime, read as a positive number of minutes.
    /// Default: one day.
    #[serde(
        rename = "token_lifetime_minutes",
        default = "default_token_lifetime",
        deserialize_with = "deserialize_lifetime"
    )]
    token_lifetime: Duration,
}

fn default_token_lifetime() -> Duration {
    Duration::days(1)
}

fn lifetime_from_minutes(minutes: i64) -> Result<Duration, String> {
    if minutes <= 0 {
        return Err(format!("token lifetime must be positive, got {minutes} minutes"));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| format!("token lifetime of {minutes} minutes is out of range"))
}

fn deserialize_lifetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let minutes = i64::deserialize(deserializer)?;
    lifetime_from_minutes(minutes).map_err(serde::de::Error::custom)
}

impl AuthConfig {
    /// Creates a configuration with the default token lifetime.
    #[must_use]
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_lifetime: default_token_lifetime(),
        }
    }

    /// Sets the token lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error unless `minutes` is positive and representable.
    pub fn with_token_lifetime_minutes(
        mut self,
        minutes: i64,
    ) -> Result<Self, config::ConfigError> {
        self.token_lifetime = lifetime_from_minutes(minutes).map_err(config::ConfigError::Message)?;
        Ok(self)
    }

    /// Returns the shared signing secret.
    #[must_use]
    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }

    /// Returns how long an issued token stays valid.
    #[must_use]
    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is missing, a value fails to parse, or
    /// the token lifetime is not a positive number of minutes.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("PANTRY_AUTH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[redacted]")
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}
