//! Azure rule set (AKS and self-managed).

use super::{
    ProviderContext, check_node_image, check_region, check_region_zones, check_registry_types,
    check_volume_type,
};
use crate::common::worker_path;
use crate::error::ValidationError;
use crate::patterns::{
    AKS_NODE_NAME, AZURE_DISK_ENCRYPTION_SET, AZURE_IDENTITY, AZURE_NODE_IMAGE,
    AZURE_PREMIUM_VOLUME,
};
use crate::rules::{RuleExt, first_duplicate, one_of};
use crate::storage_class::{
    AZURE_FS_TYPES, PARAMETERS_PATH, STORAGE_CLASS_PATH, parameter_labels, parameter_matches,
    parameter_one_of, validate_allowed, validate_encryption_key, validate_exclusivity,
};
use keos_domain::{
    ClusterSpec, ExtraVolume, InfraProvider, Networks, RegistryType, RootVolume, ScParameter,
    Security, StorageClass, WorkerNode, non_empty,
};

/// Managed disk SKUs.
pub const VOLUME_TYPES: &[&str] = &[
    "Premium_LRS",
    "PremiumV2_LRS",
    "Premium_ZRS",
    "Standard_LRS",
    "StandardSSD_LRS",
    "StandardSSD_ZRS",
    "UltraSSD_LRS",
];

/// AKS node pool OS disk kinds.
pub const AKS_ROOT_VOLUME_TYPES: &[&str] = &["Managed", "Ephemeral"];

const MANAGED_REGISTRY_TYPES: &[RegistryType] = &[RegistryType::Acr];
const UNMANAGED_REGISTRY_TYPES: &[RegistryType] = &[RegistryType::Acr, RegistryType::Generic];
const SUBNET_ROLES: &[&str] = &["control-plane", "node"];
const AKS_NODE_NAME_MAX: usize = 9;
const NODE_IMAGE_FORMAT: &str =
    "/subscriptions/[SUBSCRIPTION_ID]/resourceGroups/[RESOURCE_GROUP]/providers/Microsoft.Compute/images/[IMAGE_NAME]";
const IDENTITY_FORMAT: &str = "/subscriptions/[SUBSCRIPTION_ID]/resourceGroups/[RESOURCE_GROUP]/providers/Microsoft.ManagedIdentity/userAssignedIdentities/[IDENTITY_NAME]";

/// Resource group holding the cluster network.
#[must_use]
pub fn resource_group<'a>(spec: &'a ClusterSpec, cluster_name: &'a str) -> &'a str {
    non_empty(spec.networks.resource_group.as_ref()).unwrap_or(cluster_name)
}

/// Apply the Azure rules.
pub fn validate(context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let spec = context.spec;
    let managed = context.is_managed();
    check_region(context)?;
    validate_security(&spec.security)?;
    check_registry_types(
        &spec.docker_registries,
        if managed { MANAGED_REGISTRY_TYPES } else { UNMANAGED_REGISTRY_TYPES },
    )?;
    if managed {
        validate_aks_version(context)?;
        for worker in &spec.worker_nodes {
            validate_aks_worker(worker)?;
        }
    } else {
        let control_plane = &spec.control_plane;
        validate_machine(
            "spec.control_plane",
            control_plane.node_image.as_ref(),
            control_plane.size.as_deref().unwrap_or_default(),
            &control_plane.root_volume,
            &control_plane.extra_volumes,
        )?;
        for worker in &spec.worker_nodes {
            validate_machine(
                &worker_path(worker),
                worker.node_image.as_ref(),
                &worker.size,
                &worker.root_volume,
                &worker.extra_volumes,
            )?;
        }
    }
    validate_storage_class(&spec.storage_class, &spec.worker_nodes)?;
    validate_networks(&spec.networks, context)?;
    check_region_zones(context)
}

fn validate_security(security: &Security) -> Result<(), ValidationError> {
    let Some(identity) = non_empty(security.control_plane_identity.as_ref()) else {
        return Err(ValidationError::required("spec.security", "control_plane_identity"));
    };
    check_identity(identity, "control_plane_identity")?;
    match non_empty(security.nodes_identity.as_ref()) {
        Some(identity) => check_identity(identity, "nodes_identity"),
        None => Ok(()),
    }
}

fn check_identity(identity: &str, field: &str) -> Result<(), ValidationError> {
    if AZURE_IDENTITY.is_match(identity) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            "spec.security",
            field,
            format!("`{identity}` is invalid, it must have the format '{IDENTITY_FORMAT}'"),
        ))
    }
}

fn validate_aks_version(context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let spec = context.spec;
    let Some(offered) = context.inventory.supported_versions(&spec.region)? else {
        return Ok(());
    };
    let version = spec.k8s_version.trim().trim_start_matches('v');
    if offered.iter().any(|candidate| candidate.trim_start_matches('v') == version) {
        return Ok(());
    }
    Err(ValidationError::invalid(
        "spec",
        "k8s_version",
        format!("AKS only supports Kubernetes versions: [{}]", offered.join(", ")),
    ))
}

fn validate_aks_worker(worker: &WorkerNode) -> Result<(), ValidationError> {
    let name = worker.name.as_str();
    if !AKS_NODE_NAME.is_match(name) || name.chars().count() > AKS_NODE_NAME_MAX {
        return Err(ValidationError::invalid(
            "spec.worker_nodes",
            "name",
            format!(
                "`{name}` is invalid: AKS node pool names must be lower case alphanumeric \
                 characters and no more than {AKS_NODE_NAME_MAX} characters long"
            ),
        ));
    }
    check_volume_type(
        worker.root_volume.volume_type.as_ref(),
        &format!("{}.root_volume", worker_path(worker)),
        AKS_ROOT_VOLUME_TYPES,
    )
}

fn validate_machine(
    path: &str,
    node_image: Option<&String>,
    size: &str,
    root_volume: &RootVolume,
    extra_volumes: &[ExtraVolume],
) -> Result<(), ValidationError> {
    check_node_image(node_image, path, &AZURE_NODE_IMAGE, NODE_IMAGE_FORMAT, false)?;
    check_disk(root_volume.volume_type.as_ref(), size, &format!("{path}.root_volume"))?;
    for (index, volume) in extra_volumes.iter().enumerate() {
        let volume_path = format!("{path}.extra_volumes[{index}]");
        if non_empty(volume.name.as_ref()).is_none() {
            return Err(ValidationError::required(volume_path, "name"));
        }
        check_disk(volume.volume_type.as_ref(), size, &volume_path)?;
    }
    if let Some((index, name)) = first_duplicate(extra_volumes, |volume| non_empty(volume.name.as_ref())) {
        return Err(ValidationError::invalid(
            format!("{path}.extra_volumes[{index}]"),
            "name",
            format!("`{name}` is duplicated"),
        ));
    }
    Ok(())
}

fn check_disk(volume_type: Option<&String>, size: &str, path: &str) -> Result<(), ValidationError> {
    check_volume_type(volume_type, path, VOLUME_TYPES)?;
    match non_empty(volume_type) {
        Some(volume_type) if AZURE_PREMIUM_VOLUME.is_match(volume_type) && !has_premium_storage(size) => {
            Err(ValidationError::invalid(
                path,
                "type",
                format!("`{volume_type}` requires a size with premium storage support, `{size}` has none"),
            ))
        },
        _ => Ok(()),
    }
}

/// Size-name heuristic: premium-capable sizes carry an `s` feature flag.
#[must_use]
pub fn has_premium_storage(size: &str) -> bool {
    size.replace("Standard_", "").to_lowercase().contains('s')
}

/// Storage-class rules for managed disks.
pub fn validate_storage_class(
    storage_class: &StorageClass,
    workers: &[WorkerNode],
) -> Result<(), ValidationError> {
    validate_exclusivity(storage_class)?;
    validate_allowed(storage_class, InfraProvider::Azure)?;
    validate_encryption_key(storage_class, &AZURE_DISK_ENCRYPTION_SET)?;
    parameter_matches(storage_class, ScParameter::DiskEncryptionSetId, &AZURE_DISK_ENCRYPTION_SET)?;
    parameter_one_of(storage_class, ScParameter::FsType, AZURE_FS_TYPES, "types")?;
    parameter_one_of(storage_class, ScParameter::SkuName, VOLUME_TYPES, "types")?;

    let parameters = &storage_class.parameters;
    let sku_name = parameters.value(ScParameter::SkuName);
    let premium_class = non_empty(storage_class.class.as_ref()) == Some("premium");
    let premium_sku = sku_name.is_some_and(|sku| AZURE_PREMIUM_VOLUME.is_match(sku));
    if (premium_class || premium_sku) && !workers.iter().any(|worker| has_premium_storage(&worker.size)) {
        let (path, field) = if premium_sku {
            (PARAMETERS_PATH, ScParameter::SkuName.wire_name())
        } else {
            (STORAGE_CLASS_PATH, "class")
        };
        return Err(ValidationError::invalid(
            path,
            field,
            "premium storage requires at least one worker node size with premium storage support",
        ));
    }
    if sku_name == Some("PremiumV2_LRS") && parameters.value(ScParameter::CachingMode) == Some("ReadOnly") {
        return Err(ValidationError::invalid(
            PARAMETERS_PATH,
            ScParameter::CachingMode.wire_name(),
            "ReadOnly is not supported with skuName PremiumV2_LRS",
        ));
    }
    parameter_labels(storage_class, ScParameter::Tags)
}

fn validate_networks(networks: &Networks, context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let managed = context.is_managed();
    let vpc_cidr = non_empty(networks.vpc_cidr.as_ref());

    if !managed && vpc_cidr.is_some() {
        return Err(ValidationError::invalid(
            "spec.networks",
            "vpc_cidr",
            "is only supported in azure managed clusters",
        ));
    }

    let Some(vpc_id) = non_empty(networks.vpc_id.as_ref()) else {
        if vpc_cidr.is_some() {
            return Err(ValidationError::invalid(
                "spec.networks",
                "vpc_cidr",
                "vpc_id must be set when vpc_cidr is defined",
            ));
        }
        if !networks.subnets.is_empty() {
            return Err(ValidationError::invalid(
                "spec.networks",
                "subnets",
                "vpc_id must be set when subnets are defined",
            ));
        }
        return Ok(());
    };

    if managed && vpc_cidr.is_none() {
        return Err(ValidationError::required("spec.networks", "vpc_cidr"));
    }
    let resource_group = resource_group(context.spec, context.cluster_name);
    if let Some(vpcs) = context.inventory.vpcs()?
        && !vpcs.iter().any(|known| known == vpc_id)
    {
        return Err(ValidationError::invalid(
            "spec.networks",
            "vpc_id",
            format!("{vpc_id} does not exist in resource group {resource_group}"),
        ));
    }
    if networks.subnets.is_empty() {
        return Err(ValidationError::required("spec.networks", "subnets"));
    }

    let known = context.inventory.subnets(vpc_id)?;
    for (index, subnet) in networks.subnets.iter().enumerate() {
        let path = format!("spec.networks.subnets[{index}]");
        let Some(subnet_id) = non_empty(subnet.subnet_id.as_ref()) else {
            return Err(ValidationError::required(path, "subnet_id"));
        };
        if let Some(known) = &known
            && !known.iter().any(|candidate| candidate == subnet_id)
        {
            return Err(ValidationError::invalid(
                &path,
                "subnet_id",
                format!("{subnet_id} does not belong to vnet {vpc_id}"),
            ));
        }
        let role = non_empty(subnet.role.as_ref());
        let cidr = non_empty(subnet.cidr.as_ref());
        if managed {
            if cidr.is_none() {
                return Err(ValidationError::required(path, "cidr"));
            }
            if role.is_some() {
                return Err(ValidationError::invalid(
                    path,
                    "role",
                    "is only supported in azure unmanaged clusters",
                ));
            }
        } else {
            if cidr.is_some() {
                return Err(ValidationError::invalid(
                    path,
                    "cidr",
                    "is only supported in azure managed clusters",
                ));
            }
            let Some(role) = role else {
                return Err(ValidationError::required(path, "role"));
            };
            one_of(role, SUBNET_ROLES, "roles").or_invalid(&path, "role")?;
        }
    }
    Ok(())
}
