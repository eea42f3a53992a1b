//! # keos-app
//!
//! Application use cases for cluster validation.
//! This crate depends on `config`, `validation`, `ports`, `domain`, and `shared`.

pub mod validate_cluster;

pub use validate_cluster::{
    ValidateClusterDeps, ValidateClusterInput, ValidateClusterOutput, settings_from_config,
    validate_cluster,
};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
