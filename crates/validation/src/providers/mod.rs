//! Provider rule sets.
//!
//! One [`ProviderRules`] implementation per [`ValidatorKind`]; the managed
//! and self-managed variants of a provider share one module and differ in
//! the mode they pass down.

pub mod aws;
pub mod azure;
pub mod gcp;

use crate::common::worker_path;
use crate::error::ValidationError;
use crate::inventory::Inventory;
use crate::rules::{Pattern, RuleExt, one_of};
use crate::settings::{ValidationSettings, major_minor};
use keos_domain::{
    ClusterSpec, ControlPlaneMode, DockerRegistry, RegistryType, ValidatorKind, WorkerNode,
    non_empty,
};

/// Everything a rule set sees during a run.
pub struct ProviderContext<'a> {
    /// Descriptor spec.
    pub spec: &'a ClusterSpec,
    /// Cluster name.
    pub cluster_name: &'a str,
    /// Rule set being applied.
    pub kind: ValidatorKind,
    /// Run settings.
    pub settings: &'a ValidationSettings,
    /// Live provider inventory.
    pub inventory: Inventory<'a>,
}

impl ProviderContext<'_> {
    /// Control-plane mode of the run.
    #[must_use]
    pub const fn mode(&self) -> ControlPlaneMode {
        self.kind.mode()
    }

    /// True for managed-service kinds.
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        self.kind.is_managed()
    }
}

/// Provider-specific rules, applied after the common rules pass.
pub trait ProviderRules: Send + Sync {
    /// Kind served by this rule set.
    fn kind(&self) -> ValidatorKind;

    /// Check the descriptor, stopping at the first failure.
    fn validate(&self, context: &ProviderContext<'_>) -> Result<(), ValidationError>;
}

macro_rules! provider_rules {
    ($( $(#[$doc:meta])* $name:ident => $kind:ident, $module:ident; )+) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl ProviderRules for $name {
                fn kind(&self) -> ValidatorKind {
                    ValidatorKind::$kind
                }

                fn validate(&self, context: &ProviderContext<'_>) -> Result<(), ValidationError> {
                    $module::validate(context)
                }
            }
        )+

        /// Rule set for a validator kind.
        #[must_use]
        pub fn rules_for(kind: ValidatorKind) -> &'static dyn ProviderRules {
            match kind {
                $( ValidatorKind::$kind => &$name, )+
            }
        }
    };
}

provider_rules! {
    /// Amazon EKS.
    EksRules => AwsManaged, aws;
    /// Self-managed clusters on AWS.
    AwsUnmanagedRules => AwsUnmanaged, aws;
    /// Google GKE.
    GkeRules => GcpManaged, gcp;
    /// Self-managed clusters on GCP.
    GcpUnmanagedRules => GcpUnmanaged, gcp;
    /// Azure AKS.
    AksRules => AzureManaged, azure;
    /// Self-managed clusters on Azure.
    AzureUnmanagedRules => AzureUnmanaged, azure;
}

/// Region must be offered to the credentials.
pub(crate) fn check_region(context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let region = context.spec.region.as_str();
    match context.inventory.regions()? {
        Some(regions) if !regions.iter().any(|known| known == region) => Err(
            ValidationError::invalid("spec", "region", format!("{region} region does not exist")),
        ),
        _ => Ok(()),
    }
}

/// Registry flavours accepted by the rule set.
pub(crate) fn check_registry_types(
    registries: &[DockerRegistry],
    allowed: &[RegistryType],
) -> Result<(), ValidationError> {
    let names: Vec<&str> = allowed.iter().map(|registry_type| registry_type.as_str()).collect();
    for (index, registry) in registries.iter().enumerate() {
        one_of(registry.registry_type.as_str(), &names, "types")
            .or_invalid(&format!("spec.docker_registries[{index}]"), "type")?;
    }
    Ok(())
}

/// Machine image of `path`, required or optional.
pub(crate) fn check_node_image(
    node_image: Option<&String>,
    path: &str,
    pattern: &Pattern,
    format_hint: &str,
    required: bool,
) -> Result<(), ValidationError> {
    match non_empty(node_image) {
        None if required => Err(ValidationError::required(path, "node_image")),
        None => Ok(()),
        Some(image) if pattern.is_match(image) => Ok(()),
        Some(image) => Err(ValidationError::invalid(
            path,
            "node_image",
            format!("`{image}` is invalid, it must have the format '{format_hint}'"),
        )),
    }
}

/// Volume type of `path`, when set.
pub(crate) fn check_volume_type(
    volume_type: Option<&String>,
    path: &str,
    allowed: &[&str],
) -> Result<(), ValidationError> {
    match non_empty(volume_type) {
        None => Ok(()),
        Some(volume_type) => one_of(volume_type, allowed, "types").or_invalid(path, "type"),
    }
}

/// Explicit worker zones must be among `zones`.
pub(crate) fn check_worker_zones(
    workers: &[WorkerNode],
    zones: &[String],
    source: &str,
) -> Result<(), ValidationError> {
    for worker in workers {
        if let Some(az) = non_empty(worker.az.as_ref())
            && !zones.iter().any(|zone| zone == az)
        {
            return Err(ValidationError::invalid(
                worker_path(worker),
                "az",
                format!("{az} does not exist in {source}, azs: [{}]", zones.join(", ")),
            ));
        }
    }
    Ok(())
}

/// Worker zones against the region zones.
pub(crate) fn check_region_zones(context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let region = context.spec.region.as_str();
    if context.spec.worker_nodes.iter().all(|worker| non_empty(worker.az.as_ref()).is_none()) {
        return Ok(());
    }
    match context.inventory.availability_zones(region)? {
        Some(zones) => check_worker_zones(&context.spec.worker_nodes, &zones, &format!("region {region}")),
        None => Ok(()),
    }
}

/// Managed version must be offered, exactly or by `major.minor`.
pub(crate) fn check_offered_version(context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let spec = context.spec;
    let Some(offered) = context.inventory.supported_versions(&spec.region)? else {
        return Ok(());
    };
    let version = spec.k8s_version.trim().trim_start_matches('v');
    let minor = major_minor(version);
    let is_offered = offered.iter().any(|candidate| {
        let candidate = candidate.trim().trim_start_matches('v');
        candidate == version || minor.as_deref() == Some(candidate)
    });
    if is_offered {
        return Ok(());
    }
    let service = context.kind.managed_service().unwrap_or("the managed service");
    Err(ValidationError::invalid(
        "spec",
        "k8s_version",
        format!(
            "{} is not offered by {service} in {}, versions: [{}]",
            spec.k8s_version,
            spec.region,
            offered.join(", ")
        ),
    ))
}
