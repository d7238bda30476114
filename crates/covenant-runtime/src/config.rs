//! Runtime configuration.
//!
//! Loaded from YAML, then optionally overridden from `COVENANT_*`
//! environment variables. Durations are human-readable strings such as
//! `"250ms"`, `"10s"` or `"1h"`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use covenant_core::{FailurePolicy, KeywordClassifier, HIGH_RISK_TERMS, MEDIUM_RISK_TERMS};

use crate::resilience::CircuitBreakerConfig;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Serde adapter for `Duration` as a humantime string.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Duration>` as an optional humantime string.
pub(crate) mod option_duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Retry settings for transient enrichment failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retry)
    pub max_retries: usize,

    #[serde(with = "duration_str")]
    pub min_delay: Duration,

    #[serde(with = "duration_str")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Enrichment cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: u64,
    #[serde(with = "duration_str")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Term lists for the keyword classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub high_risk_terms: Vec<String>,
    pub medium_risk_terms: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            high_risk_terms: HIGH_RISK_TERMS.iter().map(|t| t.to_string()).collect(),
            medium_risk_terms: MEDIUM_RISK_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ClassifierConfig {
    pub fn build(&self) -> KeywordClassifier {
        KeywordClassifier::with_terms(&self.high_risk_terms, &self.medium_risk_terms)
    }
}

/// Configuration for the analysis runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Clauses analyzed concurrently
    pub max_concurrency: usize,

    /// Per-call limit for one enrichment generator, retries included
    #[serde(with = "duration_str")]
    pub enrichment_timeout: Duration,

    /// Limit for the whole pass; calls that would start after it are skipped
    #[serde(with = "option_duration_str")]
    pub deadline: Option<Duration>,

    pub failure_policy: FailurePolicy,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,
    pub classifier: ClassifierConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            enrichment_timeout: Duration::from_secs(10),
            deadline: None,
            failure_policy: FailurePolicy::default(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a YAML config.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Apply `COVENANT_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognized keys: `COVENANT_MAX_CONCURRENCY`,
    /// `COVENANT_ENRICHMENT_TIMEOUT`, `COVENANT_DEADLINE`,
    /// `COVENANT_FAILURE_POLICY`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("COVENANT_MAX_CONCURRENCY") {
            self.max_concurrency = value.trim().parse().map_err(|e| invalid("COVENANT_MAX_CONCURRENCY", e))?;
        }

        if let Some(value) = lookup("COVENANT_ENRICHMENT_TIMEOUT") {
            self.enrichment_timeout = humantime::parse_duration(value.trim())
                .map_err(|e| invalid("COVENANT_ENRICHMENT_TIMEOUT", e))?;
        }

        if let Some(value) = lookup("COVENANT_DEADLINE") {
            let value = value.trim();
            self.deadline = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(humantime::parse_duration(value).map_err(|e| invalid("COVENANT_DEADLINE", e))?)
            };
        }

        if let Some(value) = lookup("COVENANT_FAILURE_POLICY") {
            self.failure_policy = value.parse().map_err(|e| invalid("COVENANT_FAILURE_POLICY", e))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the config structure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        if self.enrichment_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "enrichment_timeout must be non-zero".to_string(),
            ));
        }

        if self
            .classifier
            .high_risk_terms
            .iter()
            .all(|t| t.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "classifier.high_risk_terms must contain at least one term".to_string(),
            ));
        }

        Ok(())
    }
}

fn invalid(key: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}
