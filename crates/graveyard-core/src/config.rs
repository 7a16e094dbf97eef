//! Job configuration
//!
//! The job takes its settings from the environment it is invoked in:
//! - `GRAVEYARD_OU_NAME`: name of the archival grouping (required)
//! - `LOG_LEVEL`: default log level (optional, `info`)

use crate::error::ConfigError;
use crate::relocation::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Environment key holding the archival grouping name
pub const GRAVEYARD_OU_NAME: &str = "GRAVEYARD_OU_NAME";

/// Environment key holding the default log level
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Log level used when none is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Name of the grouping closed accounts are filed under
    pub graveyard_ou_name: String,
    /// Default log level
    pub log_level: String,
    /// Relocation retry policy
    pub retry: RetryPolicy,
}

impl JobConfig {
    /// Create configuration for `graveyard_ou_name` with defaults elsewhere
    #[inline]
    #[must_use]
    pub fn new(graveyard_ou_name: impl Into<String>) -> Self {
        Self {
            graveyard_ou_name: graveyard_ou_name.into(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// With log level
    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Read configuration from the process environment
    ///
    /// # Errors
    /// See [`JobConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`
    ///
    /// # Errors
    /// - `ConfigError::Missing` if `GRAVEYARD_OU_NAME` is absent or blank
    /// - `ConfigError::Invalid` if `LOG_LEVEL` is not a known level
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup(GRAVEYARD_OU_NAME)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(GRAVEYARD_OU_NAME))?;

        let mut config = Self::new(name);
        if let Some(level) = lookup(LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
            config = config.with_log_level(level.trim().to_lowercase());
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that an archival grouping name is set
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` for a blank grouping name.
    pub fn require_grouping_name(&self) -> Result<(), ConfigError> {
        if self.graveyard_ou_name.trim().is_empty() {
            return Err(ConfigError::Missing(GRAVEYARD_OU_NAME));
        }
        Ok(())
    }

    /// Check settings that are not enforced by construction
    ///
    /// # Errors
    /// Returns `ConfigError` for a blank grouping name or an unknown log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.require_grouping_name()?;
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid {
                key: LOG_LEVEL,
                reason: format!(
                    "unknown level '{}', expected one of {}",
                    self.log_level,
                    LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_name_and_defaults() {
        let config = JobConfig::from_lookup(lookup(&[(GRAVEYARD_OU_NAME, "Graveyard")])).unwrap();
        assert_eq!(config.graveyard_ou_name, "Graveyard");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn log_level_is_normalized() {
        let config = JobConfig::from_lookup(lookup(&[
            (GRAVEYARD_OU_NAME, "Graveyard"),
            (LOG_LEVEL, "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_name_is_error() {
        let err = JobConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(GRAVEYARD_OU_NAME));

        let err = JobConfig::from_lookup(lookup(&[(GRAVEYARD_OU_NAME, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(GRAVEYARD_OU_NAME));
    }

    #[test]
    fn unknown_level_is_error() {
        let err = JobConfig::from_lookup(lookup(&[
            (GRAVEYARD_OU_NAME, "Graveyard"),
            (LOG_LEVEL, "verbose"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: LOG_LEVEL, .. }));
    }

    #[test]
    fn grouping_name_check_ignores_log_level() {
        let config = JobConfig::new("Graveyard").with_log_level("verbose");
        assert!(config.require_grouping_name().is_ok());
        assert!(config.validate().is_err());
        assert!(matches!(
            JobConfig::new("  ").require_grouping_name(),
            Err(ConfigError::Missing(GRAVEYARD_OU_NAME))
        ));
    }
}
