//! # keos-ports
//!
//! Port traits for the keos-validate hexagonal architecture.
//!
//! This crate defines the interfaces between the validation engine and the
//! outside world. It depends only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod cloud_metadata;
pub mod logger;

pub use cloud_metadata::*;
pub use logger::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without directly depending on `keos-domain`.
pub use keos_domain::{InfraProvider, ProviderCredentials};
