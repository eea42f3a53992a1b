//! Engine configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (TOML or JSON).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - The supported-versions list normalizes to a sorted, deduped set.

use keos_ports::LogLevel;
use keos_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Kubernetes `major.minor` versions accepted by default.
pub const DEFAULT_SUPPORTED_K8S_VERSIONS: &[&str] = &["1.24", "1.25", "1.26", "1.27", "1.28"];

const SUPPORTED_K8S_VERSIONS_MAX: usize = 64;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EngineConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Kubernetes `major.minor` versions the engine accepts.
    pub supported_k8s_versions: Vec<Box<str>>,
    /// Minimum level of emitted log events.
    pub log_level: Box<str>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            supported_k8s_versions: DEFAULT_SUPPORTED_K8S_VERSIONS
                .iter()
                .map(|version| Box::from(*version))
                .collect(),
            log_level: Box::from(LogLevel::Info.as_str()),
        }
    }
}

impl EngineConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedEngineConfig, ConfigSchemaError> {
        self.validate_version()?;
        self.normalize_versions()?;
        let log_level = parse_log_level(&self.log_level)?;
        self.log_level = Box::from(log_level.as_str());
        Ok(ValidatedEngineConfig {
            raw: self,
            log_level,
        })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }

    fn normalize_versions(&mut self) -> Result<(), ConfigSchemaError> {
        let mut normalized = Vec::with_capacity(self.supported_k8s_versions.len());
        for entry in &self.supported_k8s_versions {
            let trimmed = entry.trim().trim_start_matches('v');
            if !is_major_minor(trimmed) {
                return Err(ConfigSchemaError::InvalidK8sVersion {
                    entry: entry.to_string(),
                });
            }
            normalized.push(Box::<str>::from(trimmed));
        }

        normalized.sort_by(|left, right| version_key(left).cmp(&version_key(right)));
        normalized.dedup();

        if normalized.is_empty() {
            return Err(ConfigSchemaError::EmptyList {
                field: "supportedK8sVersions",
            });
        }
        if normalized.len() > SUPPORTED_K8S_VERSIONS_MAX {
            return Err(ConfigSchemaError::ListTooLarge {
                field: "supportedK8sVersions",
                len: normalized.len(),
                max: SUPPORTED_K8S_VERSIONS_MAX,
            });
        }

        self.supported_k8s_versions = normalized;
        Ok(())
    }
}

/// Validated config wrapper carrying the parsed log level.
#[derive(Debug, Clone)]
pub struct ValidatedEngineConfig {
    raw: EngineConfig,
    log_level: LogLevel,
}

impl ValidatedEngineConfig {
    /// Parsed log level.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Supported versions in ascending order.
    pub fn supported_k8s_versions(&self) -> impl Iterator<Item = &str> {
        self.raw.supported_k8s_versions.iter().map(AsRef::as_ref)
    }

    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &EngineConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> EngineConfig {
        self.raw
    }
}

impl AsRef<EngineConfig> for ValidatedEngineConfig {
    fn as_ref(&self) -> &EngineConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedEngineConfig {
    type Target = EngineConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse and validate a JSON config.
pub fn parse_engine_config_json(input: &str) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let config: EngineConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

/// Parse and validate a TOML config.
pub fn parse_engine_config_toml(input: &str) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let config: EngineConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

fn parse_log_level(input: &str) -> Result<LogLevel, ConfigSchemaError> {
    LogLevel::parse(input).ok_or_else(|| ConfigSchemaError::InvalidLogLevel {
        value: input.to_string(),
    })
}

fn is_major_minor(value: &str) -> bool {
    let Some((major, minor)) = value.split_once('.') else {
        return false;
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());
    digits(major) && digits(minor)
}

// Numeric order, so `1.9` sorts before `1.10`.
fn version_key(value: &str) -> (u64, u64) {
    let (major, minor) = value.split_once('.').unwrap_or((value, "0"));
    (major.parse().unwrap_or(0), minor.parse().unwrap_or(0))
}

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A supported-version entry is not `major.minor`.
    InvalidK8sVersion {
        /// Offending entry.
        entry: String,
    },
    /// A list field must not be empty.
    EmptyList {
        /// Field name in the config file.
        field: &'static str,
    },
    /// A list field exceeds the maximum allowed size.
    ListTooLarge {
        /// Field name in the config file.
        field: &'static str,
        /// Number of entries.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// The log level is not one of `debug|info|warn|error`.
    InvalidLogLevel {
        /// Value provided.
        value: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::InvalidK8sVersion { .. } => ErrorCode::new("config", "invalid_k8s_version"),
            Self::EmptyList { .. } | Self::ListTooLarge { .. } => {
                ErrorCode::new("config", "invalid_list")
            },
            Self::InvalidLogLevel { .. } => ErrorCode::new("config", "invalid_log_level"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::InvalidK8sVersion { entry } => {
                write!(
                    formatter,
                    "supportedK8sVersions entry `{entry}` must be major.minor"
                )
            },
            Self::EmptyList { field } => write!(formatter, "{field} must not be empty"),
            Self::ListTooLarge { field, len, max } => {
                write!(formatter, "{field} is too large ({len} items, max {max})")
            },
            Self::InvalidLogLevel { value } => {
                write!(
                    formatter,
                    "logLevel `{value}` is invalid; use debug, info, warn or error"
                )
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => {
                envelope = envelope
                    .with_metadata("found", found.to_string())
                    .with_metadata("supported", supported.to_string());
            },
            ConfigSchemaError::InvalidK8sVersion { entry } => {
                envelope = envelope
                    .with_metadata("field", "supportedK8sVersions")
                    .with_metadata("entry", entry);
            },
            ConfigSchemaError::EmptyList { field } => {
                envelope = envelope.with_metadata("field", field);
            },
            ConfigSchemaError::ListTooLarge { field, len, max } => {
                envelope = envelope
                    .with_metadata("field", field)
                    .with_metadata("len", len.to_string())
                    .with_metadata("max", max.to_string());
            },
            ConfigSchemaError::InvalidLogLevel { value } => {
                envelope = envelope
                    .with_metadata("field", "logLevel")
                    .with_metadata("value", value);
            },
        }

        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn defaults_are_applied() -> Result<(), Box<dyn Error>> {
        let config = parse_engine_config_json("{}")?;

        assert_eq!(config.version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.log_level(), LogLevel::Info);
        let versions: Vec<&str> = config.supported_k8s_versions().collect();
        assert_eq!(versions, DEFAULT_SUPPORTED_K8S_VERSIONS);
        Ok(())
    }

    #[test]
    fn versions_are_sorted_numerically_and_deduped() -> Result<(), Box<dyn Error>> {
        let config = parse_engine_config_toml(
            "supportedK8sVersions = [\"1.10\", \"v1.9\", \"1.10\", \" 1.27 \"]\n",
        )?;
        let versions: Vec<&str> = config.supported_k8s_versions().collect();
        assert_eq!(versions, vec!["1.9", "1.10", "1.27"]);
        Ok(())
    }

    #[test]
    fn patch_versions_are_rejected() -> Result<(), Box<dyn Error>> {
        let error = parse_engine_config_json(r#"{"supportedK8sVersions":["1.26.3"]}"#)
            .err()
            .ok_or_else(|| std::io::Error::other("expected version error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "invalid_k8s_version"));
        assert_eq!(
            error.metadata.get("entry").map(String::as_str),
            Some("1.26.3")
        );
        Ok(())
    }

    #[test]
    fn unknown_fields_and_versions_are_rejected() -> Result<(), Box<dyn Error>> {
        let unknown = parse_engine_config_json(r#"{"timeoutMs": 10}"#)
            .err()
            .ok_or_else(|| std::io::Error::other("expected unknown field error"))?;
        assert_eq!(unknown.code, ErrorCode::new("config", "invalid_json"));

        let version = parse_engine_config_json(r#"{"version": 2}"#)
            .err()
            .ok_or_else(|| std::io::Error::other("expected version error"))?;
        assert_eq!(version.code, ErrorCode::new("config", "unsupported_version"));
        Ok(())
    }

    #[test]
    fn log_level_is_normalized() -> Result<(), Box<dyn Error>> {
        let config = parse_engine_config_json(r#"{"logLevel":"WARNING"}"#)?;
        assert_eq!(config.log_level(), LogLevel::Warn);
        assert_eq!(config.log_level().as_str(), "warn");

        let error = parse_engine_config_json(r#"{"logLevel":"trace"}"#)
            .err()
            .ok_or_else(|| std::io::Error::other("expected log level error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "invalid_log_level"));
        Ok(())
    }

    #[test]
    fn empty_version_list_is_rejected() {
        let result = parse_engine_config_json(r#"{"supportedK8sVersions":[]}"#);
        assert!(matches!(
            result,
            Err(ref error) if error.code == ErrorCode::new("config", "invalid_list")
        ));
    }
}
