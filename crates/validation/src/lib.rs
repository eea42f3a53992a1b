//! # keos-validation
//!
//! Validation and credential resolution for keos cluster descriptors.
//!
//! - **Rules** - pattern, membership, range and uniqueness primitives
//! - **Common** - provider-independent descriptor rules
//! - **Providers** - AWS, GCP and Azure rule sets, managed and self-managed
//! - **Dispatcher** - [`ClusterValidator`], built per run
//! - **Credentials** - provider, registry and token resolution
//!
//! Every check is fail-fast: the first violation is returned as a
//! path-qualified [`ValidationError`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod common;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod inventory;
pub mod network;
pub mod patterns;
pub mod providers;
pub mod rules;
pub mod settings;
pub mod storage_class;

pub use common::validate_common;
pub use credentials::{registry_credential, resolve_credentials, resolve_provider_credentials};
pub use dispatcher::ClusterValidator;
pub use error::ValidationError;
pub use inventory::{Inventory, Known};
pub use network::{Ipv4Cidr, validate_pods_cidr};
pub use providers::{ProviderContext, ProviderRules, rules_for};
pub use rules::{Pattern, Rule, RuleViolation, in_range, matches, one_of, unique_by};
pub use settings::{DEFAULT_SUPPORTED_K8S_VERSIONS, ValidationSettings};

/// Returns the validation crate version.
#[must_use]
pub const fn validation_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
