//! Storage-class rules shared by the provider rule sets.
//!
//! Each provider declares the parameters it accepts as a static
//! [`ScParameter`] table; any other parameter carrying a value is rejected.

use crate::error::ValidationError;
use crate::patterns::LABELS;
use crate::rules::{Pattern, RuleExt, RuleViolation, matches, one_of};
use keos_domain::{InfraProvider, ScParameter, StorageClass, non_empty};

/// Path of the storage-class block.
pub const STORAGE_CLASS_PATH: &str = "spec.storageclass";
/// Path of the parameter bag.
pub const PARAMETERS_PATH: &str = "spec.storageclass.parameters";

/// Parameters accepted on AWS.
pub const AWS_PARAMETERS: &[ScParameter] = &[
    ScParameter::Type,
    ScParameter::FsType,
    ScParameter::Labels,
    ScParameter::AllowAutoIopsPerGbIncrease,
    ScParameter::BlockExpress,
    ScParameter::BlockSize,
    ScParameter::Iops,
    ScParameter::IopsPerGb,
    ScParameter::Encrypted,
    ScParameter::KmsKeyId,
    ScParameter::Throughput,
];

/// Parameters accepted on GCP.
pub const GCP_PARAMETERS: &[ScParameter] = &[
    ScParameter::Type,
    ScParameter::FsType,
    ScParameter::Labels,
    ScParameter::DiskEncryptionKmsKey,
    ScParameter::ProvisionedIopsOnCreate,
    ScParameter::ProvisionedThroughputOnCreate,
    ScParameter::ReplicationType,
];

/// Parameters accepted on Azure.
pub const AZURE_PARAMETERS: &[ScParameter] = &[
    ScParameter::FsType,
    ScParameter::Kind,
    ScParameter::CachingMode,
    ScParameter::DiskAccessId,
    ScParameter::DiskEncryptionSetId,
    ScParameter::DiskEncryptionType,
    ScParameter::EnableBursting,
    ScParameter::EnablePerformancePlus,
    ScParameter::NetworkAccessPolicy,
    ScParameter::Provisioner,
    ScParameter::PublicNetworkAccess,
    ScParameter::ResourceGroup,
    ScParameter::SkuName,
    ScParameter::SubscriptionId,
    ScParameter::Tags,
];

/// Filesystems accepted on AWS and GCP.
pub const FS_TYPES: &[&str] = &["xfs", "ext3", "ext4", "ext2"];
/// Filesystems accepted on Azure.
pub const AZURE_FS_TYPES: &[&str] = &["xfs", "ext3", "ext4", "ext2", "btrfs"];

/// Allow-list table of a provider.
#[must_use]
pub const fn allowed_parameters(provider: InfraProvider) -> &'static [ScParameter] {
    match provider {
        InfraProvider::Aws => AWS_PARAMETERS,
        InfraProvider::Gcp => GCP_PARAMETERS,
        InfraProvider::Azure => AZURE_PARAMETERS,
    }
}

/// `class` and `encryptionKey` exclude explicit parameters.
pub fn validate_exclusivity(storage_class: &StorageClass) -> Result<(), ValidationError> {
    if storage_class.parameters.is_empty() {
        return Ok(());
    }
    if non_empty(storage_class.class.as_ref()).is_some() {
        return Err(ValidationError::invariant(
            STORAGE_CLASS_PATH,
            "class and parameters cannot be set at the same time",
        ));
    }
    if non_empty(storage_class.encryption_key.as_ref()).is_some() {
        return Err(ValidationError::invariant(
            STORAGE_CLASS_PATH,
            "encryptionKey and parameters cannot be set at the same time",
        ));
    }
    Ok(())
}

/// Every set parameter must be on the provider's table.
pub fn validate_allowed(
    storage_class: &StorageClass,
    provider: InfraProvider,
) -> Result<(), ValidationError> {
    let allowed = allowed_parameters(provider);
    if let Some(key) = storage_class.parameters.unrecognized_keys().next() {
        let supported: Vec<&str> = allowed.iter().map(|parameter| parameter.wire_name()).collect();
        return Err(ValidationError::invalid(
            PARAMETERS_PATH,
            key,
            format!("is not supported by {provider}, supported fields: {}", supported.join(", ")),
        ));
    }
    match storage_class
        .parameters
        .set_fields()
        .find(|parameter| !allowed.contains(parameter))
    {
        None => Ok(()),
        Some(parameter) => Err(ValidationError::invalid(
            PARAMETERS_PATH,
            parameter.wire_name(),
            format!("is not supported by {provider}"),
        )),
    }
}

/// Format check on `encryptionKey`.
pub fn validate_encryption_key(
    storage_class: &StorageClass,
    pattern: &Pattern,
) -> Result<(), ValidationError> {
    match non_empty(storage_class.encryption_key.as_ref()) {
        None => Ok(()),
        Some(key) => matches(key, pattern).or_invalid(STORAGE_CLASS_PATH, "encryptionKey"),
    }
}

/// Format check on a parameter, when set.
pub fn parameter_matches(
    storage_class: &StorageClass,
    parameter: ScParameter,
    pattern: &Pattern,
) -> Result<(), ValidationError> {
    match storage_class.parameters.value(parameter) {
        None => Ok(()),
        Some(value) => matches(value, pattern).or_invalid(PARAMETERS_PATH, parameter.wire_name()),
    }
}

/// Membership check on a parameter, when set.
pub fn parameter_one_of(
    storage_class: &StorageClass,
    parameter: ScParameter,
    allowed: &[&str],
    noun: &str,
) -> Result<(), ValidationError> {
    match storage_class.parameters.value(parameter) {
        None => Ok(()),
        Some(value) => one_of(value, allowed, noun).or_invalid(PARAMETERS_PATH, parameter.wire_name()),
    }
}

/// `key1=value1,key2=value2` format on a parameter, when set.
pub fn parameter_labels(
    storage_class: &StorageClass,
    parameter: ScParameter,
) -> Result<(), ValidationError> {
    match storage_class.parameters.value(parameter) {
        None => Ok(()),
        Some(value) => matches(value, &LABELS)
            .map_err(|_| {
                RuleViolation::new("incorrect format. Must have the format 'key1=value1,key2=value2'")
            })
            .or_invalid(PARAMETERS_PATH, parameter.wire_name()),
    }
}
