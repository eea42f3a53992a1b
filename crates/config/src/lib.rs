//! # keos-config
//!
//! Document parsing and engine settings.
//!
//! - **Documents** - `KeosCluster` descriptors and clear-text secrets (YAML/JSON)
//! - **Schema** - `EngineConfig` with validation and normalization
//! - **Env** - strict `KEOS_*` overrides merged over file values
//! - **Load** - deterministic file + env precedence
//!
//! ## Dependency Rules
//!
//! - Depends on `domain`, `ports` and `shared`
//! - No validation rules; this crate only shapes input

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod document;
pub mod env;
pub mod load;
pub mod schema;

pub use document::{
    DocumentError, DocumentFormat, KEOS_CLUSTER_KIND, parse_descriptor, parse_secrets,
};
pub use env::{
    ENV_LOG_LEVEL, ENV_SUPPORTED_K8S_VERSIONS, EngineEnv, EnvParseError, apply_env_overrides,
};
pub use load::{
    load_descriptor_from_path, load_engine_config_from_path, load_engine_config_std_env,
    load_secrets_from_path, to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_SUPPORTED_K8S_VERSIONS, EngineConfig,
    ValidatedEngineConfig, parse_engine_config_json, parse_engine_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_crate_compiles() {
        assert!(!config_crate_version().is_empty());
    }
}
