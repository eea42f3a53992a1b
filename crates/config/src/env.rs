//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict; invalid values fail fast. CSV lists are validated
//! here and normalized by the schema.

use crate::schema::{EngineConfig, ValidatedEngineConfig};
use keos_ports::LogLevel;
use keos_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: supported Kubernetes `major.minor` versions (CSV).
pub const ENV_SUPPORTED_K8S_VERSIONS: &str = "KEOS_SUPPORTED_K8S_VERSIONS";
/// Env var: minimum log level.
pub const ENV_LOG_LEVEL: &str = "KEOS_LOG_LEVEL";

const CSV_MAX_ITEMS: usize = 64;

/// Parsed env overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineEnv {
    /// `KEOS_SUPPORTED_K8S_VERSIONS`.
    pub supported_k8s_versions: Option<Vec<Box<str>>>,
    /// `KEOS_LOG_LEVEL`.
    pub log_level: Option<LogLevel>,
}

impl EngineEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            supported_k8s_versions: parse_optional_csv(map, ENV_SUPPORTED_K8S_VERSIONS)?,
            log_level: parse_optional_log_level(map, ENV_LOG_LEVEL)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in [ENV_SUPPORTED_K8S_VERSIONS, ENV_LOG_LEVEL] {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: EngineConfig,
    env: &EngineEnv,
) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(versions) = &env.supported_k8s_versions {
        config.supported_k8s_versions.clone_from(versions);
    }
    if let Some(level) = env.log_level {
        config.log_level = Box::from(level.as_str());
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Env parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// CSV list exceeds a safety limit.
    CsvTooLarge {
        /// Env var name.
        var: &'static str,
        /// Number of parsed items.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
            Self::CsvTooLarge { .. } => ErrorCode::new("config", "invalid_env_csv"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
            Self::CsvTooLarge { var, len, max } => {
                write!(formatter, "{var} is too large ({len} items, max {max})")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => {
                envelope = envelope.with_metadata("env_var", var);
            },
            EnvParseError::InvalidEnum { var, value } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", redact_if_secret(var, &value));
            },
            EnvParseError::CsvTooLarge { var, len, max } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("len", len.to_string())
                    .with_metadata("max", max.to_string());
            },
        }

        envelope
    }
}

fn parse_optional_trimmed<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<&'a str>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed))
}

fn parse_optional_log_level(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<LogLevel>, EnvParseError> {
    parse_optional_trimmed(map, var)?
        .map(|value| {
            LogLevel::parse(value).ok_or_else(|| EnvParseError::InvalidEnum {
                var,
                value: value.to_string(),
            })
        })
        .transpose()
}

fn parse_optional_csv(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Vec<Box<str>>>, EnvParseError> {
    let Some(value) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };
    let items = parse_csv(value);
    if items.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    if items.len() > CSV_MAX_ITEMS {
        return Err(EnvParseError::CsvTooLarge {
            var,
            len: items.len(),
            max: CSV_MAX_ITEMS,
        });
    }
    Ok(Some(items.into_iter().map(Box::from).collect()))
}

fn parse_csv(input: &str) -> Vec<&str> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn env_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn missing_vars_default_to_none() -> Result<(), Box<dyn Error>> {
        let env = EngineEnv::from_map(&BTreeMap::new())?;
        assert_eq!(env, EngineEnv::default());
        Ok(())
    }

    #[test]
    fn csv_versions_skip_blank_entries() -> Result<(), Box<dyn Error>> {
        let env = EngineEnv::from_map(&env_map(&[(
            ENV_SUPPORTED_K8S_VERSIONS,
            " 1.27, ,1.28 ,",
        )]))?;
        let versions = env
            .supported_k8s_versions
            .ok_or_else(|| std::io::Error::other("missing versions"))?;
        let as_str: Vec<&str> = versions.iter().map(AsRef::as_ref).collect();
        assert_eq!(as_str, vec!["1.27", "1.28"]);
        Ok(())
    }

    #[test]
    fn blank_values_fail_fast() {
        let error = EngineEnv::from_map(&env_map(&[(ENV_LOG_LEVEL, "   ")])).err();
        assert_eq!(
            error,
            Some(EnvParseError::EmptyValue { var: ENV_LOG_LEVEL })
        );

        let error = EngineEnv::from_map(&env_map(&[(ENV_SUPPORTED_K8S_VERSIONS, " , ")])).err();
        assert_eq!(
            error,
            Some(EnvParseError::EmptyValue {
                var: ENV_SUPPORTED_K8S_VERSIONS
            })
        );
    }

    #[test]
    fn invalid_log_level_keeps_value_in_metadata() -> Result<(), Box<dyn Error>> {
        let error = EngineEnv::from_map(&env_map(&[(ENV_LOG_LEVEL, "loud")]))
            .err()
            .ok_or_else(|| std::io::Error::other("expected enum error"))?;
        let envelope: ErrorEnvelope = error.into();

        assert_eq!(envelope.code, ErrorCode::new("config", "invalid_env_enum"));
        assert_eq!(
            envelope.metadata.get("env_var").map(String::as_str),
            Some(ENV_LOG_LEVEL)
        );
        assert_eq!(
            envelope.metadata.get("value").map(String::as_str),
            Some("loud")
        );
        Ok(())
    }

    #[test]
    fn env_wins_over_base_config() -> Result<(), Box<dyn Error>> {
        let env = EngineEnv::from_map(&env_map(&[
            (ENV_SUPPORTED_K8S_VERSIONS, "1.29,1.28"),
            (ENV_LOG_LEVEL, "debug"),
        ]))?;
        let config = apply_env_overrides(EngineConfig::default(), &env)?;

        let versions: Vec<&str> = config.supported_k8s_versions().collect();
        assert_eq!(versions, vec!["1.28", "1.29"]);
        assert_eq!(config.log_level(), LogLevel::Debug);
        Ok(())
    }

    #[test]
    fn env_versions_are_validated_by_the_schema() {
        let env = EngineEnv {
            supported_k8s_versions: Some(vec![Box::from("latest")]),
            log_level: None,
        };
        let result = apply_env_overrides(EngineConfig::default(), &env);
        assert!(matches!(
            result,
            Err(ref error) if error.code == ErrorCode::new("config", "invalid_k8s_version")
        ));
    }
}
