//! Environment configuration.

use std::path::PathBuf;

use thiserror::Error;

use supplychain_core::{DomainError, Identity};
use supplychain_observability::{LogFormat, ParseLogFormatError};

pub const DEPLOYER_VAR: &str = "SUPPLYCHAIN_DEPLOYER";
pub const LOG_FORMAT_VAR: &str = "SUPPLYCHAIN_LOG_FORMAT";
pub const SCRIPT_VAR: &str = "SUPPLYCHAIN_SCRIPT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SUPPLYCHAIN_DEPLOYER='{value}' is not a valid identity: {source}")]
    InvalidDeployer { value: String, source: DomainError },

    #[error("SUPPLYCHAIN_LOG_FORMAT: {0}")]
    InvalidLogFormat(#[from] ParseLogFormatError),
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    /// Identity seeded as the first administrator. `None` means "generate one".
    pub deployer: Option<Identity>,
    pub log_format: LogFormat,
    /// Call script to replay after deployment.
    pub script: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let deployer = get(DEPLOYER_VAR)
            .map(|value| {
                value
                    .parse::<Identity>()
                    .map_err(|source| ConfigError::InvalidDeployer { value, source })
            })
            .transpose()?;

        let log_format = get(LOG_FORMAT_VAR)
            .map(|value| value.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();

        let script = get(SCRIPT_VAR).map(PathBuf::from);

        Ok(Self {
            deployer,
            log_format,
            script,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_all_settings() {
        let deployer = Identity::new();
        let deployer_str = deployer.to_string();
        let config = RuntimeConfig::from_lookup(lookup(&[
            (DEPLOYER_VAR, deployer_str.as_str()),
            (LOG_FORMAT_VAR, "pretty"),
            (SCRIPT_VAR, "calls.json"),
        ]))
        .unwrap();

        assert_eq!(config.deployer, Some(deployer));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.script, Some(PathBuf::from("calls.json")));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = RuntimeConfig::from_lookup(lookup(&[(DEPLOYER_VAR, "  "), (SCRIPT_VAR, "")])).unwrap();
        assert_eq!(config.deployer, None);
        assert_eq!(config.script, None);
    }

    #[test]
    fn rejects_malformed_deployer() {
        let err = RuntimeConfig::from_lookup(lookup(&[(DEPLOYER_VAR, "0xabc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDeployer { ref value, .. } if value == "0xabc"));
        assert!(err.to_string().contains(DEPLOYER_VAR));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let err = RuntimeConfig::from_lookup(lookup(&[(LOG_FORMAT_VAR, "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat(_)));
    }
}
