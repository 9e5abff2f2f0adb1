//! Engine configuration.
//!
//! Every setting has a default; environment variables override them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoicegate_invoicing::{AdmissionPolicy, TransitionPolicy};
use invoicegate_invoicing::admission::{
    DEFAULT_AGE_LIMIT_DAYS, DEFAULT_PROXIMITY_WINDOW_DAYS, MAX_WINDOW_DAYS,
};

pub const ENV_AGE_LIMIT_DAYS: &str = "INVOICEGATE_AGE_LIMIT_DAYS";
pub const ENV_PROXIMITY_WINDOW_DAYS: &str = "INVOICEGATE_PROXIMITY_WINDOW_DAYS";
pub const ENV_TRANSITION_POLICY: &str = "INVOICEGATE_TRANSITION_POLICY";
pub const ENV_LOG_FILTER: &str = "INVOICEGATE_LOG";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: expected a whole number of days, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: must be positive, got {value}")]
    NonPositive { var: &'static str, value: i64 },

    #[error("{var}: at most {max} days allowed, got {value}")]
    TooLarge { var: &'static str, value: i64, max: i64 },

    #[error("{var}: unknown transition policy '{value}'")]
    InvalidPolicy { var: &'static str, value: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "invalid_config"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub age_limit_days: i64,
    pub proximity_window_days: i64,
    pub transition_policy: TransitionPolicy,
    /// `tracing-subscriber` filter directive.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            age_limit_days: DEFAULT_AGE_LIMIT_DAYS,
            proximity_window_days: DEFAULT_PROXIMITY_WINDOW_DAYS,
            transition_policy: TransitionPolicy::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Missing or blank values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(value) = read(ENV_AGE_LIMIT_DAYS) {
            config.age_limit_days = parse_days(ENV_AGE_LIMIT_DAYS, &value)?;
        }
        if let Some(value) = read(ENV_PROXIMITY_WINDOW_DAYS) {
            config.proximity_window_days = parse_days(ENV_PROXIMITY_WINDOW_DAYS, &value)?;
        }
        if let Some(value) = read(ENV_TRANSITION_POLICY) {
            config.transition_policy = value.parse().map_err(|_| ConfigError::InvalidPolicy {
                var: ENV_TRANSITION_POLICY,
                value,
            })?;
        }
        if let Some(value) = read(ENV_LOG_FILTER) {
            config.log_filter = value;
        }

        Ok(config)
    }

    /// Install the process-wide JSON subscriber filtered by `log_filter`.
    pub fn init_logging(&self) {
        invoicegate_observability::init_with_filter(&self.log_filter);
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            age_limit_days: self.age_limit_days,
            proximity_window_days: self.proximity_window_days,
        }
    }
}

fn parse_days(var: &'static str, value: &str) -> Result<i64, ConfigError> {
    let days: i64 = value.parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })?;
    if days <= 0 {
        return Err(ConfigError::NonPositive { var, value: days });
    }
    if days > MAX_WINDOW_DAYS {
        return Err(ConfigError::TooLarge {
            var,
            value: days,
            max: MAX_WINDOW_DAYS,
        });
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.age_limit_days, 90);
        assert_eq!(config.proximity_window_days, 180);
        assert_eq!(config.transition_policy, TransitionPolicy::Permissive);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            (ENV_AGE_LIMIT_DAYS, "30"),
            (ENV_PROXIMITY_WINDOW_DAYS, " 45 "),
            (ENV_TRANSITION_POLICY, "Strict"),
            (ENV_LOG_FILTER, "invoicegate=debug"),
        ])
        .unwrap();
        assert_eq!(config.admission_policy().age_limit_days, 30);
        assert_eq!(config.admission_policy().proximity_window_days, 45);
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.log_filter, "invoicegate=debug");
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = config_from(&[(ENV_AGE_LIMIT_DAYS, "ninety")]).unwrap_err();
        assert!(err.to_string().starts_with(ENV_AGE_LIMIT_DAYS));

        let err = config_from(&[(ENV_PROXIMITY_WINDOW_DAYS, "0")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositive {
                var: ENV_PROXIMITY_WINDOW_DAYS,
                value: 0
            }
        );

        let err = config_from(&[(ENV_TRANSITION_POLICY, "lenient")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPolicy { .. }));
    }

    #[test]
    fn oversized_windows_are_refused() {
        let err = config_from(&[(ENV_AGE_LIMIT_DAYS, "100000000")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TooLarge {
                var: ENV_AGE_LIMIT_DAYS,
                value: 100_000_000,
                max: MAX_WINDOW_DAYS
            }
        );

        let err = config_from(&[(ENV_PROXIMITY_WINDOW_DAYS, "9223372036854775807")]).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { .. }));

        let err = config_from(&[(ENV_PROXIMITY_WINDOW_DAYS, "99999999999999999999")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let edge = config_from(&[(ENV_AGE_LIMIT_DAYS, "36500")]).unwrap();
        assert_eq!(edge.age_limit_days, MAX_WINDOW_DAYS);
    }

    #[test]
    fn configured_log_filter_installs_subscriber() {
        let config = config_from(&[(ENV_LOG_FILTER, "invoicegate_infra=debug")]).unwrap();
        config.init_logging();
        config.init_logging();
        tracing::debug!(filter = %config.log_filter, "logging configured");
    }

    #[test]
    fn deserializes_partial_json() {
        let config: EngineConfig = serde_json::from_str(r#"{"age_limit_days": 60}"#).unwrap();
        assert_eq!(config.age_limit_days, 60);
        assert_eq!(config.proximity_window_days, 180);
    }
}
