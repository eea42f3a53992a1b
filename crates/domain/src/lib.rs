//! # keos-domain
//!
//! Domain model of a keos cluster descriptor.
//!
//! - **Provider** - `InfraProvider`, `ControlPlaneMode`, `ValidatorKind`
//! - **Descriptor** - `ClusterDescriptor`, `ClusterSpec` and its blocks
//! - **Storage class** - `StorageClass`, `ScParameter` keys
//! - **Secrets** - inline and secrets-document credential blocks
//! - **Credentials** - the resolved `ClusterCredentials` output and key-casing table
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure data with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use keos_shared::shared_crate_version;

pub mod credentials;
pub mod descriptor;
pub mod provider;
pub mod secrets;
pub mod storage_class;

pub use credentials::{
    ClusterCredentials, CredentialField, CredentialMap, FlattenedCredentials, KEOS_REGISTRY_KEY,
    KeyCase, ProviderCredentials, RegistryCredential,
};
pub use descriptor::{
    ClusterDescriptor, ClusterSpec, ControlPlane, DockerRegistry, ExtraVolume, Networks,
    RegistryType, RootVolume, Security, Subnet, WorkerNode, ZoneDistribution, non_empty,
};
pub use provider::{ControlPlaneMode, InfraProvider, ProviderError, ValidatorKind};
pub use secrets::{
    AwsCredentials, AzureCredentials, CredentialBlock, Credentials, DockerRegistryCredentials,
    GcpCredentials, ProviderSecret, Secrets,
};
pub use storage_class::{ScParameter, StorageClass, StorageClassParameters};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
