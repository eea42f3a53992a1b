//! Metadata lookups as seen by the rule sets.
//!
//! Wraps a [`CloudMetadataPort`] so that an empty answer becomes `None`
//! (skip the cross-check) and a port error becomes a fatal
//! [`ValidationError::Metadata`] carrying provider context.

use crate::error::ValidationError;
use keos_domain::InfraProvider;
use keos_ports::{CloudMetadataPort, MetadataOperation};

/// Inventory answer; `None` when the collaborator had no data.
pub type Known = Option<Vec<String>>;

/// Provider inventory for one validation run.
pub struct Inventory<'a> {
    provider: InfraProvider,
    port: &'a dyn CloudMetadataPort,
}

impl<'a> Inventory<'a> {
    /// Wrap a connected port.
    pub fn new(provider: InfraProvider, port: &'a dyn CloudMetadataPort) -> Self {
        Self { provider, port }
    }

    /// Provider being queried.
    #[must_use]
    pub const fn provider(&self) -> InfraProvider {
        self.provider
    }

    /// Regions visible to the credentials.
    pub fn regions(&self) -> Result<Known, ValidationError> {
        self.fetch(MetadataOperation::ListRegions, || self.port.list_regions())
    }

    /// Zones of `region`.
    pub fn availability_zones(&self, region: &str) -> Result<Known, ValidationError> {
        self.fetch(MetadataOperation::ListAvailabilityZones, || {
            self.port.list_availability_zones(region)
        })
    }

    /// Networks in scope.
    pub fn vpcs(&self) -> Result<Known, ValidationError> {
        self.fetch(MetadataOperation::ListVpcs, || self.port.list_vpcs())
    }

    /// Subnets of `vpc_id`.
    pub fn subnets(&self, vpc_id: &str) -> Result<Known, ValidationError> {
        self.fetch(MetadataOperation::ListSubnets, || self.port.list_subnets(vpc_id))
    }

    /// Managed versions offered in `region`.
    pub fn supported_versions(&self, region: &str) -> Result<Known, ValidationError> {
        self.fetch(MetadataOperation::ListSupportedVersions, || {
            self.port.list_supported_versions(region)
        })
    }

    /// Distinct zones of the private subnets among `subnet_ids`.
    pub fn private_subnet_zones(&self, subnet_ids: &[String]) -> Result<Known, ValidationError> {
        let zones = self.fetch(MetadataOperation::ListPrivateSubnetZones, || {
            self.port.list_private_subnet_zones(subnet_ids)
        })?;
        Ok(zones.map(|mut zones| {
            zones.sort_unstable();
            zones.dedup();
            zones
        }))
    }

    fn fetch(
        &self,
        operation: MetadataOperation,
        call: impl FnOnce() -> keos_shared::Result<Vec<String>>,
    ) -> Result<Known, ValidationError> {
        let values = call().map_err(|error| ValidationError::metadata(self.provider, operation, error))?;
        if values.is_empty() {
            tracing::debug!(
                provider = %self.provider,
                operation = %operation,
                "metadata returned no data, skipping cross-check"
            );
            return Ok(None);
        }
        Ok(Some(values))
    }
}
