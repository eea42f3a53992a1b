//! Cloud metadata boundary contract.
//!
//! Implementations enumerate live provider inventory. An empty list means
//! "no data" (limited permissions, offline mode) and callers skip the
//! corresponding cross-check; an `Err` is an actual lookup failure.

use keos_domain::{InfraProvider, ProviderCredentials};
use keos_shared::Result;
use std::fmt;

/// Lookup performed against the provider inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataOperation {
    /// Build a client for the scope.
    Connect,
    /// Regions visible to the credentials.
    ListRegions,
    /// Zones of a region.
    ListAvailabilityZones,
    /// Networks (VPCs/VNets).
    ListVpcs,
    /// Subnets of a network.
    ListSubnets,
    /// Managed Kubernetes versions offered in a region.
    ListSupportedVersions,
    /// Zones of a set of private subnets.
    ListPrivateSubnetZones,
}

impl MetadataOperation {
    /// Stable identifier used in error codes and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::ListRegions => "list_regions",
            Self::ListAvailabilityZones => "list_availability_zones",
            Self::ListVpcs => "list_vpcs",
            Self::ListSubnets => "list_subnets",
            Self::ListSupportedVersions => "list_supported_versions",
            Self::ListPrivateSubnetZones => "list_private_subnet_zones",
        }
    }
}

impl fmt::Display for MetadataOperation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// What a metadata client is connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataScope {
    /// Target provider.
    pub provider: InfraProvider,
    /// Region of the cluster.
    pub region: String,
    /// Resource group (Azure only).
    pub resource_group: Option<String>,
    /// Resolved provider credentials.
    pub credentials: ProviderCredentials,
}

/// Read-only provider inventory.
pub trait CloudMetadataPort: Send + Sync {
    /// Regions visible to the credentials.
    fn list_regions(&self) -> Result<Vec<String>>;

    /// Availability zones of `region`.
    fn list_availability_zones(&self, region: &str) -> Result<Vec<String>>;

    /// Network identifiers in scope.
    fn list_vpcs(&self) -> Result<Vec<String>>;

    /// Subnet identifiers of `vpc_id`.
    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<String>>;

    /// Managed Kubernetes versions offered in `region`.
    fn list_supported_versions(&self, region: &str) -> Result<Vec<String>>;

    /// Distinct zones of the private subnets among `subnet_ids`.
    fn list_private_subnet_zones(&self, subnet_ids: &[String]) -> Result<Vec<String>> {
        let _ = subnet_ids;
        Ok(Vec::new())
    }
}

/// Builds a metadata client for one validation run.
pub trait CloudMetadataConnector: Send + Sync {
    /// Connect using the scope's credentials.
    fn connect(&self, scope: &MetadataScope) -> Result<Box<dyn CloudMetadataPort>>;
}
