//! Canonical cluster descriptor schema.
//!
//! One schema serves every provider; provider-specific blocks are optional
//! and ignored by the rule sets that do not use them.

use crate::provider::{ControlPlaneMode, InfraProvider, ValidatorKind};
use crate::secrets::Credentials;
use crate::storage_class::StorageClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A named cluster plus its parsed spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    /// Cluster name (`metadata.name` of the `KeosCluster` document).
    pub name: String,
    /// Desired cluster state.
    pub spec: ClusterSpec,
}

impl ClusterDescriptor {
    /// Build a descriptor from a name and spec.
    pub fn new(name: impl Into<String>, spec: ClusterSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    /// Rule set selected by provider and control-plane mode.
    #[must_use]
    pub const fn validator_kind(&self) -> ValidatorKind {
        ValidatorKind::select(
            self.spec.infra_provider,
            ControlPlaneMode::from_managed(self.spec.control_plane.managed),
        )
    }
}

/// The parsed `spec` block of a cluster descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Target cloud provider.
    pub infra_provider: InfraProvider,
    /// Kubernetes version, `v` prefixed (`v1.26.8`).
    #[serde(default)]
    pub k8s_version: String,
    /// Provider region.
    #[serde(default)]
    pub region: String,
    /// Control-plane settings.
    #[serde(default)]
    pub control_plane: ControlPlane,
    /// Worker node groups.
    #[serde(default)]
    pub worker_nodes: Vec<WorkerNode>,
    /// Network layout.
    #[serde(default)]
    pub networks: Networks,
    /// Default storage class.
    #[serde(default, rename = "storageclass")]
    pub storage_class: StorageClass,
    /// Container registries.
    #[serde(default)]
    pub docker_registries: Vec<DockerRegistry>,
    /// Inline credentials (fallback for the secrets document).
    #[serde(default)]
    pub credentials: Credentials,
    /// Identity settings (Azure).
    #[serde(default)]
    pub security: Security,
}

impl ClusterSpec {
    /// Minimal spec for a provider; everything else defaulted.
    #[must_use]
    pub fn new(infra_provider: InfraProvider) -> Self {
        Self {
            infra_provider,
            k8s_version: String::new(),
            region: String::new(),
            control_plane: ControlPlane::default(),
            worker_nodes: Vec::new(),
            networks: Networks::default(),
            storage_class: StorageClass::default(),
            docker_registries: Vec::new(),
            credentials: Credentials::default(),
            security: Security::default(),
        }
    }

    /// The registry flagged as primary, when exactly one is present.
    #[must_use]
    pub fn keos_registry(&self) -> Option<&DockerRegistry> {
        let mut primary = self.docker_registries.iter().filter(|registry| registry.keos_registry);
        match (primary.next(), primary.next()) {
            (Some(registry), None) => Some(registry),
            _ => None,
        }
    }
}

/// Control-plane block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlane {
    /// Provider-managed control plane (EKS/GKE/AKS).
    #[serde(default)]
    pub managed: bool,
    /// Machine image for self-managed control-plane nodes.
    #[serde(default)]
    pub node_image: Option<String>,
    /// Machine size for self-managed control-plane nodes.
    #[serde(default)]
    pub size: Option<String>,
    /// Run three control-plane replicas.
    #[serde(default = "default_true")]
    pub highly_available: bool,
    /// Root disk.
    #[serde(default)]
    pub root_volume: RootVolume,
    /// Additional disks.
    #[serde(default)]
    pub extra_volumes: Vec<ExtraVolume>,
}

impl Default for ControlPlane {
    fn default() -> Self {
        Self {
            managed: false,
            node_image: None,
            size: None,
            highly_available: true,
            root_volume: RootVolume::default(),
            extra_volumes: Vec::new(),
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Root disk of a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootVolume {
    /// Size in GiB.
    #[serde(default)]
    pub size: u32,
    /// Provider volume type.
    #[serde(default, rename = "type")]
    pub volume_type: Option<String>,
    /// Encrypt at rest.
    #[serde(default)]
    pub encrypted: bool,
}

/// An additional disk attached to a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraVolume {
    /// Volume name (Azure).
    #[serde(default)]
    pub name: Option<String>,
    /// Block device name (AWS).
    #[serde(default)]
    pub device_name: Option<String>,
    /// Size in GiB.
    #[serde(default)]
    pub size: u32,
    /// Provider volume type.
    #[serde(default, rename = "type")]
    pub volume_type: Option<String>,
    /// Filesystem label.
    #[serde(default)]
    pub label: Option<String>,
    /// Encrypt at rest.
    #[serde(default)]
    pub encrypted: bool,
    /// Mount path inside the node.
    #[serde(default)]
    pub mount_path: Option<String>,
}

/// How a worker group spreads across zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneDistribution {
    /// Spread evenly over (at least) three zones.
    Balanced,
    /// Place the group where `az` says.
    Unbalanced,
}

impl ZoneDistribution {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Unbalanced => "unbalanced",
        }
    }
}

impl fmt::Display for ZoneDistribution {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A worker node group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerNode {
    /// Group name.
    pub name: String,
    /// Machine image.
    #[serde(default)]
    pub node_image: Option<String>,
    /// Desired node count.
    #[serde(default)]
    pub quantity: i32,
    /// Autoscaler lower bound.
    #[serde(default)]
    pub min_size: Option<i32>,
    /// Autoscaler upper bound.
    #[serde(default)]
    pub max_size: Option<i32>,
    /// Machine size.
    #[serde(default)]
    pub size: String,
    /// Zone placement policy; unset behaves as balanced unless `az` is given.
    #[serde(default)]
    pub zone_distribution: Option<ZoneDistribution>,
    /// Explicit availability zone.
    #[serde(default)]
    pub az: Option<String>,
    /// SSH key name.
    #[serde(default)]
    pub ssh_key: Option<String>,
    /// Use spot/preemptible machines.
    #[serde(default)]
    pub spot: bool,
    /// Kubernetes node labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Kubernetes taints, `key=value:Effect`.
    #[serde(default)]
    pub taints: Vec<String>,
    /// Root disk.
    #[serde(default)]
    pub root_volume: RootVolume,
    /// Additional disks.
    #[serde(default)]
    pub extra_volumes: Vec<ExtraVolume>,
}

impl WorkerNode {
    /// True when the group can host system workloads.
    #[must_use]
    pub fn is_schedulable_system_pool(&self) -> bool {
        !self.spot && self.taints.is_empty()
    }

    /// True when the group is spread across zones (explicitly or by default).
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        match self.zone_distribution {
            Some(ZoneDistribution::Balanced) => true,
            Some(ZoneDistribution::Unbalanced) => false,
            None => non_empty(self.az.as_ref()).is_none(),
        }
    }
}

/// Network layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Networks {
    /// Existing VPC/VNet identifier.
    #[serde(default)]
    pub vpc_id: Option<String>,
    /// VNet CIDR (Azure managed).
    #[serde(default)]
    pub vpc_cidr: Option<String>,
    /// Secondary pods CIDR (AWS).
    #[serde(default)]
    pub pods_cidr: Option<String>,
    /// Resource group holding the network (Azure).
    #[serde(default)]
    pub resource_group: Option<String>,
    /// Existing subnets.
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    /// Existing pods subnets (AWS).
    #[serde(default)]
    pub pods_subnets: Vec<Subnet>,
}

/// An existing subnet reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    /// Provider subnet identifier.
    #[serde(default)]
    pub subnet_id: Option<String>,
    /// Subnet CIDR (Azure managed).
    #[serde(default)]
    pub cidr: Option<String>,
    /// `control-plane` or `node` (Azure unmanaged).
    #[serde(default)]
    pub role: Option<String>,
}

/// Registry flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryType {
    /// Azure Container Registry.
    Acr,
    /// Amazon Elastic Container Registry.
    Ecr,
    /// Google Artifact Registry.
    Gar,
    /// Google Container Registry.
    Gcr,
    /// Any other OCI registry.
    Generic,
}

impl RegistryType {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acr => "acr",
            Self::Ecr => "ecr",
            Self::Gar => "gar",
            Self::Gcr => "gcr",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A container registry reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerRegistry {
    /// Registry URL, the identity key.
    pub url: String,
    /// Registry flavour.
    #[serde(rename = "type")]
    pub registry_type: RegistryType,
    /// Pulling requires credentials.
    #[serde(default)]
    pub auth_required: bool,
    /// Primary image source for the cluster.
    #[serde(default)]
    pub keos_registry: bool,
}

/// Azure managed identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// Identity assigned to control-plane machines.
    #[serde(default)]
    pub control_plane_identity: Option<String>,
    /// Identity assigned to worker machines.
    #[serde(default)]
    pub nodes_identity: Option<String>,
}

/// Returns the value when it is present and not blank.
#[must_use]
pub fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(zone_distribution: Option<ZoneDistribution>, az: Option<&str>) -> WorkerNode {
        WorkerNode {
            name: "workers".to_string(),
            zone_distribution,
            az: az.map(str::to_string),
            ..WorkerNode::default()
        }
    }

    #[test]
    fn unset_distribution_without_az_is_balanced() {
        assert!(worker(None, None).is_balanced());
        assert!(worker(None, Some("")).is_balanced());
        assert!(!worker(None, Some("eu-west-1a")).is_balanced());
        assert!(worker(Some(ZoneDistribution::Balanced), None).is_balanced());
        assert!(!worker(Some(ZoneDistribution::Unbalanced), None).is_balanced());
    }

    #[test]
    fn keos_registry_requires_a_single_flag() {
        let mut spec = ClusterSpec::new(InfraProvider::Aws);
        let registry = |url: &str, keos_registry| DockerRegistry {
            url: url.to_string(),
            registry_type: RegistryType::Generic,
            auth_required: false,
            keos_registry,
        };
        spec.docker_registries = vec![registry("a.io", false), registry("b.io", true)];
        assert_eq!(spec.keos_registry().map(|r| r.url.as_str()), Some("b.io"));

        spec.docker_registries.push(registry("c.io", true));
        assert!(spec.keos_registry().is_none());
    }

    #[test]
    fn descriptor_selects_validator_kind() {
        let mut spec = ClusterSpec::new(InfraProvider::Azure);
        spec.control_plane.managed = true;
        let descriptor = ClusterDescriptor::new("demo", spec);
        assert_eq!(descriptor.validator_kind(), ValidatorKind::AzureManaged);
    }

    #[test]
    fn control_plane_defaults_to_highly_available() {
        assert!(ControlPlane::default().highly_available);
    }
}
