//! Loading helpers (env + file) for engine settings and documents.
//!
//! The loader keeps a deterministic merge order and surfaces user-facing
//! errors as typed `ErrorEnvelope`s.

use crate::document::{DocumentFormat, parse_descriptor, parse_secrets};
use crate::env::{EngineEnv, apply_env_overrides};
use crate::schema::{EngineConfig, ValidatedEngineConfig};
use keos_domain::{ClusterDescriptor, Secrets};
use keos_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the engine config from an optional file path.
///
/// Precedence (highest wins):
/// - env overrides (`EngineEnv`)
/// - config file (TOML or JSON, by extension)
/// - defaults (`EngineConfig::default()`)
pub fn load_engine_config_from_path(
    config_path: Option<&Path>,
    env: &EngineEnv,
) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let config = match config_path {
        None => EngineConfig::default(),
        Some(path) => {
            let config_text = read_file(path, "config")?;
            let format = detect_config_format(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

/// Load the engine config from std env and an optional file path.
pub fn load_engine_config_std_env(
    config_path: Option<&Path>,
) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let env = EngineEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_engine_config_from_path(config_path, &env)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &EngineConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Read and parse a descriptor file.
pub fn load_descriptor_from_path(path: &Path) -> Result<ClusterDescriptor, ErrorEnvelope> {
    let format = DocumentFormat::from_path(path).map_err(ErrorEnvelope::from)?;
    let text = read_file(path, "descriptor")?;
    parse_descriptor(&text, format)
        .map_err(|error| ErrorEnvelope::from(error).with_metadata("path", display_path(path)))
}

/// Read and parse a clear-text secrets file.
pub fn load_secrets_from_path(path: &Path) -> Result<Secrets, ErrorEnvelope> {
    let format = DocumentFormat::from_path(path).map_err(ErrorEnvelope::from)?;
    let text = read_file(path, "secrets")?;
    parse_secrets(&text, format)
        .map_err(|error| ErrorEnvelope::from(error).with_metadata("path", display_path(path)))
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<EngineConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn read_file(path: &Path, source: &'static str) -> Result<String, ErrorEnvelope> {
    tracing::debug!(path = %path.display(), source, "reading file");
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "file_permission_denied")
            },
            _ => ErrorCode::new("config", "file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read {source} file: {error}"))
            .with_metadata("path", display_path(path))
            .with_metadata("source", source)
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keos_ports::LogLevel;
    use std::collections::BTreeMap;
    use std::error::Error;

    #[test]
    fn missing_config_uses_defaults() -> Result<(), Box<dyn Error>> {
        let config = load_engine_config_from_path(None, &EngineEnv::default())?;
        assert_eq!(config.as_ref(), &EngineConfig::default());
        Ok(())
    }

    #[test]
    fn invalid_config_value_overridden_by_valid_env_succeeds() -> Result<(), Box<dyn Error>> {
        let base = parse_config_unvalidated("logLevel = \"chatty\"\n", ConfigFormat::Toml)?;
        let mut map = BTreeMap::new();
        map.insert("KEOS_LOG_LEVEL".to_string(), "error".to_string());
        let env = EngineEnv::from_map(&map)?;

        let config = apply_env_overrides(base, &env)?;
        assert_eq!(config.log_level(), LogLevel::Error);
        Ok(())
    }

    #[test]
    fn unsupported_config_extension_fails() {
        let result = detect_config_format(Path::new("engine.yaml"));
        assert!(matches!(
            result,
            Err(ref error) if error.code == ErrorCode::new("config", "unsupported_format")
        ));
    }

    #[test]
    fn missing_files_report_not_found() {
        let path = Path::new("/nonexistent/keos/cluster.yaml");
        let result = load_descriptor_from_path(path);
        assert!(matches!(
            result,
            Err(ref error) if error.code == ErrorCode::new("config", "file_not_found")
                && error.metadata.get("source").map(String::as_str) == Some("descriptor")
        ));
    }

    #[test]
    fn pretty_toml_round_trips_through_the_parser() -> Result<(), Box<dyn Error>> {
        let rendered = to_pretty_toml(&EngineConfig::default())?;
        assert!(rendered.ends_with('\n'));
        let parsed = parse_config_unvalidated(&rendered, ConfigFormat::Toml)?;
        assert_eq!(parsed, EngineConfig::default());
        Ok(())
    }
}
