//! Offline cloud inventory.
//!
//! Serves a fixed snapshot instead of calling provider APIs. Anything the
//! snapshot does not list comes back empty, so the matching cross-check is
//! skipped.

use keos_ports::{CloudMetadataConnector, CloudMetadataPort, InfraProvider, MetadataScope};
use keos_shared::{ErrorCode, ErrorEnvelope, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Recorded provider inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct InventorySnapshot {
    /// Region names.
    pub regions: Vec<String>,
    /// Zones per region.
    pub availability_zones: BTreeMap<String, Vec<String>>,
    /// Subnet ids per network.
    pub vpcs: BTreeMap<String, Vec<String>>,
    /// Managed versions per region.
    pub supported_versions: BTreeMap<String, Vec<String>>,
    /// Zone of each private subnet.
    pub private_subnets: BTreeMap<String, String>,
}

impl InventorySnapshot {
    /// Parse a JSON snapshot.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid inventory snapshot JSON: {error}"),
            )
            .with_metadata("source", "inventory")
        })
    }
}

/// Inventory port backed by a snapshot.
#[derive(Debug, Clone, Default)]
pub struct OfflineCloudMetadata {
    snapshot: Arc<InventorySnapshot>,
}

impl OfflineCloudMetadata {
    /// Port with no data; every cross-check is skipped.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Port serving `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: InventorySnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }
}

fn lookup(map: &BTreeMap<String, Vec<String>>, key: &str) -> Vec<String> {
    map.get(key).cloned().unwrap_or_default()
}

impl CloudMetadataPort for OfflineCloudMetadata {
    fn list_regions(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.regions.clone())
    }

    fn list_availability_zones(&self, region: &str) -> Result<Vec<String>> {
        Ok(lookup(&self.snapshot.availability_zones, region))
    }

    fn list_vpcs(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.vpcs.keys().cloned().collect())
    }

    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<String>> {
        Ok(lookup(&self.snapshot.vpcs, vpc_id))
    }

    fn list_supported_versions(&self, region: &str) -> Result<Vec<String>> {
        Ok(lookup(&self.snapshot.supported_versions, region))
    }

    fn list_private_subnet_zones(&self, subnet_ids: &[String]) -> Result<Vec<String>> {
        let mut zones: Vec<String> = subnet_ids
            .iter()
            .filter_map(|subnet_id| self.snapshot.private_subnets.get(subnet_id).cloned())
            .collect();
        zones.sort();
        zones.dedup();
        Ok(zones)
    }
}

/// Connector handing out one snapshot per provider.
#[derive(Debug, Clone, Default)]
pub struct OfflineConnector {
    snapshots: BTreeMap<InfraProvider, OfflineCloudMetadata>,
}

impl OfflineConnector {
    /// Connector without snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `snapshot` for `provider`.
    #[must_use]
    pub fn with_snapshot(mut self, provider: InfraProvider, snapshot: InventorySnapshot) -> Self {
        self.snapshots
            .insert(provider, OfflineCloudMetadata::from_snapshot(snapshot));
        self
    }
}

impl CloudMetadataConnector for OfflineConnector {
    fn connect(&self, scope: &MetadataScope) -> Result<Box<dyn CloudMetadataPort>> {
        let metadata = self.snapshots.get(&scope.provider).cloned().unwrap_or_default();
        tracing::debug!(
            provider = %scope.provider,
            region = %scope.region,
            offline = true,
            "connected to inventory snapshot"
        );
        Ok(Box::new(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    const SNAPSHOT: &str = r#"{
        "regions": ["eu-west-1"],
        "availabilityZones": { "eu-west-1": ["eu-west-1a", "eu-west-1b", "eu-west-1c"] },
        "vpcs": { "vpc-1": ["subnet-a", "subnet-b"] },
        "privateSubnets": { "subnet-a": "eu-west-1a", "subnet-b": "eu-west-1a" }
    }"#;

    #[test]
    fn snapshot_answers_lookups() -> std::result::Result<(), Box<dyn Error>> {
        let metadata = OfflineCloudMetadata::from_snapshot(InventorySnapshot::from_json(SNAPSHOT)?);

        assert_eq!(metadata.list_regions()?, vec!["eu-west-1".to_string()]);
        assert_eq!(metadata.list_availability_zones("eu-west-1")?.len(), 3);
        assert_eq!(metadata.list_vpcs()?, vec!["vpc-1".to_string()]);
        assert!(metadata.list_subnets("vpc-2")?.is_empty());
        assert!(metadata.list_supported_versions("eu-west-1")?.is_empty());

        let subnets = ["subnet-a".to_string(), "subnet-b".to_string()];
        assert_eq!(
            metadata.list_private_subnet_zones(&subnets)?,
            vec!["eu-west-1a".to_string()]
        );
        Ok(())
    }

    #[test]
    fn connector_serves_the_snapshot_of_the_scope_provider() -> std::result::Result<(), Box<dyn Error>> {
        let connector = OfflineConnector::new().with_snapshot(
            InfraProvider::Aws,
            InventorySnapshot {
                regions: vec!["eu-west-1".to_string()],
                ..InventorySnapshot::default()
            },
        );
        let scope = |provider| MetadataScope {
            provider,
            region: "eu-west-1".to_string(),
            resource_group: None,
            credentials: keos_ports::ProviderCredentials::default(),
        };

        assert_eq!(connector.connect(&scope(InfraProvider::Aws))?.list_regions()?.len(), 1);
        assert!(connector.connect(&scope(InfraProvider::Gcp))?.list_regions()?.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_snapshot_fields_are_rejected() {
        let result = InventorySnapshot::from_json(r#"{"zones": []}"#);
        assert!(matches!(
            result,
            Err(ref error) if error.code == ErrorCode::new("config", "invalid_json")
        ));
    }
}
