//! AWS rule set (EKS and self-managed).

use super::{
    ProviderContext, check_node_image, check_offered_version, check_region,
    check_registry_types, check_volume_type, check_worker_zones,
};
use crate::common::worker_path;
use crate::error::ValidationError;
use crate::network::validate_pods_cidr;
use crate::patterns::{AWS_KMS_KEY, AWS_NODE_IMAGE};
use crate::rules::{RuleExt, first_duplicate, in_range, integer};
use crate::storage_class::{
    FS_TYPES, PARAMETERS_PATH, parameter_labels, parameter_matches, parameter_one_of,
    validate_allowed, validate_encryption_key, validate_exclusivity,
};
use keos_domain::{
    ClusterSpec, ExtraVolume, InfraProvider, Networks, RegistryType, RootVolume, ScParameter,
    StorageClass, Subnet, non_empty,
};

/// EBS volume types.
pub const VOLUME_TYPES: &[&str] = &[
    "io1", "io2", "gp2", "gp3", "sc1", "st1", "standard", "sbp1", "sbg1",
];

const REGISTRY_TYPES: &[RegistryType] = &[RegistryType::Ecr, RegistryType::Generic];
const IOPS_VOLUME_TYPES: &[&str] = &["io1", "io2", "gp3"];
const GP3_IOPS: (i64, i64) = (3000, 16000);
const PROVISIONED_IOPS: (i64, i64) = (16000, 64000);
const MIN_ZONES: usize = 3;
const NODE_IMAGE_FORMAT: &str = "ami-[IMAGE_ID]";

/// Apply the AWS rules.
pub fn validate(context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let spec = context.spec;
    check_region(context)?;
    check_registry_types(&spec.docker_registries, REGISTRY_TYPES)?;
    if context.is_managed() {
        check_offered_version(context)?;
    } else {
        validate_machine(
            "spec.control_plane",
            spec.control_plane.node_image.as_ref(),
            &spec.control_plane.root_volume,
            &spec.control_plane.extra_volumes,
        )?;
    }
    for worker in &spec.worker_nodes {
        validate_machine(
            &worker_path(worker),
            worker.node_image.as_ref(),
            &worker.root_volume,
            &worker.extra_volumes,
        )?;
    }
    validate_storage_class(&spec.storage_class)?;
    validate_networks(&spec.networks, context)?;
    validate_zones(spec, context)
}

fn validate_machine(
    path: &str,
    node_image: Option<&String>,
    root_volume: &RootVolume,
    extra_volumes: &[ExtraVolume],
) -> Result<(), ValidationError> {
    check_node_image(node_image, path, &AWS_NODE_IMAGE, NODE_IMAGE_FORMAT, false)?;
    check_volume_type(root_volume.volume_type.as_ref(), &format!("{path}.root_volume"), VOLUME_TYPES)?;
    for (index, volume) in extra_volumes.iter().enumerate() {
        let volume_path = format!("{path}.extra_volumes[{index}]");
        if non_empty(volume.device_name.as_ref()).is_none() {
            return Err(ValidationError::required(volume_path, "device_name"));
        }
        check_volume_type(volume.volume_type.as_ref(), &volume_path, VOLUME_TYPES)?;
    }
    if let Some((index, device)) =
        first_duplicate(extra_volumes, |volume| non_empty(volume.device_name.as_ref()))
    {
        return Err(ValidationError::invalid(
            format!("{path}.extra_volumes[{index}]"),
            "device_name",
            format!("`{device}` is duplicated"),
        ));
    }
    Ok(())
}

/// Storage-class rules for EBS.
pub fn validate_storage_class(storage_class: &StorageClass) -> Result<(), ValidationError> {
    validate_exclusivity(storage_class)?;
    validate_allowed(storage_class, InfraProvider::Aws)?;
    validate_encryption_key(storage_class, &AWS_KMS_KEY)?;

    let parameters = &storage_class.parameters;
    parameter_one_of(storage_class, ScParameter::Type, VOLUME_TYPES, "types")?;
    parameter_matches(storage_class, ScParameter::KmsKeyId, &AWS_KMS_KEY)?;
    if parameters.value(ScParameter::KmsKeyId).is_some()
        && parameters.value(ScParameter::Encrypted) != Some("true")
    {
        return Err(ValidationError::invalid(
            PARAMETERS_PATH,
            ScParameter::Encrypted.wire_name(),
            "must be \"true\" when kmsKeyId is set",
        ));
    }
    parameter_one_of(storage_class, ScParameter::FsType, FS_TYPES, "types")?;

    let volume_type = parameters.value(ScParameter::Type);
    for parameter in [ScParameter::Iops, ScParameter::IopsPerGb] {
        let Some(value) = parameters.value(parameter) else {
            continue;
        };
        if let Some(volume_type) = volume_type
            && !IOPS_VOLUME_TYPES.contains(&volume_type)
        {
            return Err(ValidationError::invalid(
                PARAMETERS_PATH,
                parameter.wire_name(),
                format!("is only supported for {} volume types", IOPS_VOLUME_TYPES.join(", ")),
            ));
        }
        let iops = integer(value).map_err(|violation| {
            ValidationError::invalid(PARAMETERS_PATH, parameter.wire_name(), violation.reason)
        })?;
        if let Some((min, max)) = iops_bounds(volume_type, storage_class.class.as_deref()) {
            in_range(iops, min, max).or_invalid(PARAMETERS_PATH, parameter.wire_name())?;
        }
    }
    parameter_labels(storage_class, ScParameter::Labels)
}

/// IOPS window for the effective volume type, if it has one.
fn iops_bounds(volume_type: Option<&str>, class: Option<&str>) -> Option<(i64, i64)> {
    match (volume_type, class) {
        (Some("gp3"), _) | (None, Some("standard")) => Some(GP3_IOPS),
        (Some("io1" | "io2"), _) | (None, Some("premium")) => Some(PROVISIONED_IOPS),
        _ => None,
    }
}

fn validate_networks(networks: &Networks, context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    if !networks.pods_subnets.is_empty() && non_empty(networks.pods_cidr.as_ref()).is_none() {
        return Err(ValidationError::invalid(
            "spec.networks",
            "pods_subnets",
            "pods_cidr must be set when pods_subnets are defined",
        ));
    }
    if let Some(pods_cidr) = non_empty(networks.pods_cidr.as_ref()) {
        validate_pods_cidr(pods_cidr)?;
    }

    let Some(vpc_id) = non_empty(networks.vpc_id.as_ref()) else {
        for (field, subnets) in [("subnets", &networks.subnets), ("pods_subnets", &networks.pods_subnets)] {
            if !subnets.is_empty() {
                return Err(ValidationError::invalid(
                    "spec.networks",
                    field,
                    format!("vpc_id must be set when {field} are defined"),
                ));
            }
        }
        return Ok(());
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
    if networks.subnets.is_empty() {
        return Err(ValidationError::required("spec.networks", "subnets"));
    }
    let known = context.inventory.subnets(vpc_id)?;
    check_subnets("subnets", &networks.subnets, vpc_id, known.as_deref())?;
    check_subnets("pods_subnets", &networks.pods_subnets, vpc_id, known.as_deref())
}

fn check_subnets(
    field: &str,
    subnets: &[Subnet],
    vpc_id: &str,
    known: Option<&[String]>,
) -> Result<(), ValidationError> {
    for (index, subnet) in subnets.iter().enumerate() {
        let path = format!("spec.networks.{field}[{index}]");
        let Some(subnet_id) = non_empty(subnet.subnet_id.as_ref()) else {
            return Err(ValidationError::required(path, "subnet_id"));
        };
        if let Some(known) = known
            && !known.iter().any(|candidate| candidate == subnet_id)
        {
            return Err(ValidationError::invalid(
                path,
                "subnet_id",
                format!("{subnet_id} does not belong to vpc {vpc_id}"),
            ));
        }
    }
    Ok(())
}

fn validate_zones(spec: &ClusterSpec, context: &ProviderContext<'_>) -> Result<(), ValidationError> {
    let region = spec.region.as_str();
    let subnet_ids: Vec<String> = spec
        .networks
        .subnets
        .iter()
        .filter_map(|subnet| non_empty(subnet.subnet_id.as_ref()).map(str::to_string))
        .collect();

    if subnet_ids.is_empty() {
        let Some(zones) = context.inventory.availability_zones(region)? else {
            return Ok(());
        };
        if zones.len() < MIN_ZONES {
            return Err(ValidationError::invariant(
                "spec",
                format!(
                    "insufficient Availability Zones in region {region}, it must have at least {MIN_ZONES}"
                ),
            ));
        }
        let usable: Vec<String> = zones.into_iter().take(MIN_ZONES).collect();
        return check_worker_zones(&spec.worker_nodes, &usable, &format!("region {region}"));
    }

    let Some(zones) = context.inventory.private_subnet_zones(&subnet_ids)? else {
        return Ok(());
    };
    if zones.len() < MIN_ZONES {
        return Err(ValidationError::invariant(
            "spec.networks",
            format!(
                "insufficient Availability Zones in region {region}, add at least {MIN_ZONES} \
                 private subnets in different Availability Zones"
            ),
        ));
    }
    check_worker_zones(&spec.worker_nodes, &zones, "the private subnets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use keos_domain::StorageClassParameters;

    fn storage_class(parameters: StorageClassParameters) -> StorageClass {
        StorageClass {
            parameters,
            ..StorageClass::default()
        }
    }

    #[test]
    fn gp3_iops_window() {
        let parameters = |iops: &str| StorageClassParameters {
            volume_type: Some("gp3".to_string()),
            iops: Some(iops.to_string()),
            ..StorageClassParameters::default()
        };
        assert_eq!(validate_storage_class(&storage_class(parameters("3000"))), Ok(()));
        assert!(validate_storage_class(&storage_class(parameters("20000"))).is_err());
        assert!(validate_storage_class(&storage_class(parameters("lots"))).is_err());
    }

    #[test]
    fn iops_per_gb_shares_the_type_window() {
        let parameters = |volume_type: Option<&str>| StorageClassParameters {
            volume_type: volume_type.map(str::to_string),
            iops_per_gb: Some("50".to_string()),
            ..StorageClassParameters::default()
        };
        assert!(validate_storage_class(&storage_class(parameters(Some("gp3")))).is_err());
        assert!(validate_storage_class(&storage_class(parameters(Some("io1")))).is_err());
        assert_eq!(validate_storage_class(&storage_class(parameters(None))), Ok(()));
    }

    #[test]
    fn untyped_iops_have_no_window() {
        let parameters = StorageClassParameters {
            iops: Some("500".to_string()),
            ..StorageClassParameters::default()
        };
        assert_eq!(validate_storage_class(&storage_class(parameters)), Ok(()));
        assert_eq!(iops_bounds(None, Some("standard")), Some(GP3_IOPS));
        assert_eq!(iops_bounds(None, Some("premium")), Some(PROVISIONED_IOPS));
        assert_eq!(iops_bounds(Some("gp2"), None), None);
    }

    #[test]
    fn io2_iops_window() {
        let parameters = StorageClassParameters {
            volume_type: Some("io2".to_string()),
            iops: Some("32000".to_string()),
            ..StorageClassParameters::default()
        };
        assert_eq!(validate_storage_class(&storage_class(parameters)), Ok(()));
    }

    #[test]
    fn iops_need_a_provisioned_type() {
        let parameters = StorageClassParameters {
            volume_type: Some("st1".to_string()),
            iops: Some("4000".to_string()),
            ..StorageClassParameters::default()
        };
        assert!(validate_storage_class(&storage_class(parameters)).is_err());
    }

    #[test]
    fn kms_key_requires_encryption() {
        let key = "arn:aws:kms:eu-west-1:123456789012:key/0a1b2c3d-aaaa-bbbb-cccc-0123456789ab";
        let mut parameters = StorageClassParameters {
            kms_key_id: Some(key.to_string()),
            ..StorageClassParameters::default()
        };
        assert!(validate_storage_class(&storage_class(parameters.clone())).is_err());
        parameters.encrypted = Some("true".to_string());
        assert_eq!(validate_storage_class(&storage_class(parameters)), Ok(()));

        let bad_key = StorageClass {
            encryption_key: Some("alias/keos".to_string()),
            ..StorageClass::default()
        };
        assert!(validate_storage_class(&bad_key).is_err());
    }

    #[test]
    fn extra_volume_devices() {
        let volume = |device: Option<&str>| ExtraVolume {
            device_name: device.map(str::to_string),
            volume_type: Some("gp3".to_string()),
            ..ExtraVolume::default()
        };
        let root = RootVolume::default();
        assert_eq!(validate_machine("spec.control_plane", None, &root, &[volume(Some("/dev/xvdb"))]), Ok(()));
        assert!(matches!(
            validate_machine("spec.control_plane", None, &root, &[volume(None)]),
            Err(ValidationError::RequiredValue { .. })
        ));
        assert!(
            validate_machine(
                "spec.control_plane",
                None,
                &root,
                &[volume(Some("/dev/xvdb")), volume(Some("/dev/xvdb"))]
            )
            .is_err()
        );
    }
}
