//! GCP rule set (GKE and self-managed).

use super::{
    ProviderContext, check_node_image, check_offered_version, check_region, check_region_zones,
    check_registry_types, check_volume_type,
};
use crate::common::worker_path;
use crate::error::ValidationError;
use crate::patterns::{GCP_KMS_KEY, GCP_NODE_IMAGE, GKE_VERSION};
use crate::rules::{RuleExt, integer, matches};
use crate::settings::major_minor;
use crate::storage_class::{
    FS_TYPES, PARAMETERS_PATH, parameter_labels, parameter_matches, parameter_one_of,
    validate_allowed, validate_encryption_key, validate_exclusivity,
};
use keos_domain::{
    ExtraVolume, InfraProvider, Networks, RegistryType, RootVolume, ScParameter, StorageClass,
    non_empty,
};

/// Persistent disk types.
pub const VOLUME_TYPES: &[&str] = &["pd-balanced", "pd-ssd", "pd-standard", "pd-extreme"];

const MANAGED_REGISTRY_TYPES: &[RegistryType] = &[RegistryType::Gar, RegistryType::Gcr];
const UNMANAGED_REGISTRY_TYPES: &[RegistryType] =
    &[RegistryType::Gar, RegistryType::Gcr, RegistryType::Generic];
const REPLICATION_TYPES: &[&str] = &["none", "regional-pd"];
const PD_EXTREME: &str = "pd-extreme";
const PD_EXTREME_MIN_MINOR: u32 = 26;
const NODE_IMAGE_FORMAT: &str = "projects/[PROJECT_ID]/global/images/[IMAGE_NAME]";

/// Apply the GCP rules.
pub fn validate(context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let spec = context.spec;
    let managed = context.is_managed();
    check_region(context)?;
    check_registry_types(
        &spec.docker_registries,
        if managed { MANAGED_REGISTRY_TYPES } else { UNMANAGED_REGISTRY_TYPES },
    )?;
    if managed {
        matches(&spec.k8s_version, &GKE_VERSION).or_invalid("spec", "k8s_version")?;
        check_offered_version(context)?;
    } else {
        validate_machine(
            "spec.control_plane",
            spec.control_plane.node_image.as_ref(),
            &spec.control_plane.root_volume,
            &spec.control_plane.extra_volumes,
            true,
        )?;
    }
    for worker in &spec.worker_nodes {
        validate_machine(
            &worker_path(worker),
            worker.node_image.as_ref(),
            &worker.root_volume,
            &worker.extra_volumes,
            !managed,
        )?;
    }
    validate_storage_class(&spec.storage_class, managed, &spec.k8s_version)?;
    validate_networks(&spec.networks, context)?;
    check_region_zones(context)
}

fn validate_machine(
    path: &str,
    node_image: Option<&String>,
    root_volume: &RootVolume,
    extra_volumes: &[ExtraVolume],
    image_required: bool,
) -> Result<(), ValidationError> {
    check_node_image(node_image, path, &GCP_NODE_IMAGE, NODE_IMAGE_FORMAT, image_required)?;
    check_volume_type(root_volume.volume_type.as_ref(), &format!("{path}.root_volume"), VOLUME_TYPES)?;
    for (index, volume) in extra_volumes.iter().enumerate() {
        check_volume_type(
            volume.volume_type.as_ref(),
            &format!("{path}.extra_volumes[{index}]"),
            VOLUME_TYPES,
        )?;
    }
    Ok(())
}

/// Storage-class rules for persistent disks.
pub fn validate_storage_class(
    storage_class: &StorageClass,
    managed: bool,
    k8s_version: &str,
) -> Result<(), ValidationError> {
    validate_exclusivity(storage_class)?;
    validate_allowed(storage_class, InfraProvider::Gcp)?;
    validate_encryption_key(storage_class, &GCP_KMS_KEY)?;
    parameter_matches(storage_class, ScParameter::DiskEncryptionKmsKey, &GCP_KMS_KEY)?;
    parameter_one_of(storage_class, ScParameter::Type, VOLUME_TYPES, "types")?;
    parameter_one_of(storage_class, ScParameter::FsType, FS_TYPES, "types")?;

    let parameters = &storage_class.parameters;
    let volume_type = parameters.value(ScParameter::Type);
    if managed && volume_type == Some(PD_EXTREME) && !supports_pd_extreme(k8s_version) {
        return Err(ValidationError::invalid(
            PARAMETERS_PATH,
            ScParameter::Type.wire_name(),
            format!("{PD_EXTREME} requires kubernetes 1.{PD_EXTREME_MIN_MINOR} or later"),
        ));
    }
    if let Some(iops) = parameters.value(ScParameter::ProvisionedIopsOnCreate) {
        let field = ScParameter::ProvisionedIopsOnCreate.wire_name();
        if volume_type != Some(PD_EXTREME) {
            return Err(ValidationError::invalid(
                PARAMETERS_PATH,
                field,
                format!("is only supported for {PD_EXTREME} volume type"),
            ));
        }
        integer(iops).map(|_| ()).or_invalid(PARAMETERS_PATH, field)?;
    }
    parameter_one_of(storage_class, ScParameter::ReplicationType, REPLICATION_TYPES, "types")?;
    parameter_labels(storage_class, ScParameter::Labels)
}

fn supports_pd_extreme(k8s_version: &str) -> bool {
    major_minor(k8s_version)
        .and_then(|version| {
            let (major, minor) = version.split_once('.')?;
            Some((major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?))
        })
        .is_some_and(|(major, minor)| major > 1 || minor >= PD_EXTREME_MIN_MINOR)
}

fn validate_networks(networks: &Networks, context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let Some(vpc_id) = non_empty(networks.vpc_id.as_ref()) else {
        if networks.subnets.is_empty() {
            return Ok(());
        }
        return Err(ValidationError::invalid(
            "spec.networks",
            "subnets",
            "vpc_id must be set when subnets are defined",
        ));
    };
    let [subnet] = networks.subnets.as_slice() else {
        return Err(ValidationError::invalid(
            "spec.networks",
            "subnets",
            "exactly one subnet must be defined when vpc_id is set",
        ));
    };
    if let Some(vpcs) = context.inventory.vpcs()?
        && !vpcs.iter().any(|known| known == vpc_id)
    {
        return Err(ValidationError::invalid(
            "spec.networks",
            "vpc_id",
            format!("{vpc_id} does not exist"),
        ));
    }
    let Some(subnet_id) = non_empty(subnet.subnet_id.as_ref()) else {
        return Err(ValidationError::required("spec.networks.subnets[0]", "subnet_id"));
    };
    match context.inventory.subnets(vpc_id)? {
        Some(known) if !known.iter().any(|candidate| candidate == subnet_id) => {
            Err(ValidationError::invalid(
                "spec.networks.subnets[0]",
                "subnet_id",
                format!("{subnet_id} does not belong to vpc {vpc_id}"),
            ))
        },
        _ => Ok(()),
    }
}
