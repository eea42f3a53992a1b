//! Storage-class block and its parameter bag.
//!
//! Parameters are modelled as optional fields plus a closed [`ScParameter`]
//! key enum, so allow-lists are plain `&[ScParameter]` tables.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Default storage class requested for the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageClass {
    /// Provider key used to encrypt volumes.
    #[serde(default, rename = "encryptionKey")]
    pub encryption_key: Option<String>,
    /// Predefined class (`standard` or `premium`).
    #[serde(default)]
    pub class: Option<String>,
    /// Explicit provisioner parameters.
    #[serde(default)]
    pub parameters: StorageClassParameters,
}

macro_rules! storage_class_parameters {
    ($( $(#[$doc:meta])* $variant:ident => $field:ident : $wire:literal ),+ $(,)?) => {
        /// Key of a storage-class parameter, named by its wire form.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ScParameter {
            $( $(#[$doc])* $variant, )+
        }

        impl ScParameter {
            /// Every known parameter, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Key as written in the descriptor.
            #[must_use]
            pub const fn wire_name(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        /// Provisioner parameters; the legal subset depends on the provider.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct StorageClassParameters {
            $(
                $(#[$doc])*
                #[serde(
                    default,
                    rename = $wire,
                    deserialize_with = "scalar_string",
                    skip_serializing_if = "Option::is_none"
                )]
                pub $field: Option<String>,
            )+
            /// Keys that name no known parameter, kept so allow-lists can reject them.
            #[serde(flatten)]
            pub unrecognized: BTreeMap<String, Value>,
        }

        impl StorageClassParameters {
            /// Raw value of a parameter, if present and not blank.
            #[must_use]
            pub fn value(&self, parameter: ScParameter) -> Option<&str> {
                let raw = match parameter {
                    $( ScParameter::$variant => self.$field.as_deref(), )+
                };
                raw.filter(|value| !value.trim().is_empty())
            }
        }
    };
}

storage_class_parameters! {
    /// Volume type.
    Type => volume_type: "type",
    /// Filesystem type.
    FsType => fs_type: "fsType",
    /// Volume labels, `key=value[,key=value]`.
    Labels => labels: "labels",
    /// AWS: let IOPS grow with size.
    AllowAutoIopsPerGbIncrease => allow_auto_iops_per_gb_increase: "allowAutoIOPSPerGBIncrease",
    /// AWS: io2 Block Express.
    BlockExpress => block_express: "blockExpress",
    /// AWS: filesystem block size.
    BlockSize => block_size: "blockSize",
    /// AWS: provisioned IOPS.
    Iops => iops: "iops",
    /// AWS: IOPS per GiB.
    IopsPerGb => iops_per_gb: "iopsPerGB",
    /// AWS: encrypt volumes.
    Encrypted => encrypted: "encrypted",
    /// AWS: KMS key ARN.
    KmsKeyId => kms_key_id: "kmsKeyId",
    /// AWS: throughput in MiB/s.
    Throughput => throughput: "throughput",
    /// GCP: Cloud KMS key.
    DiskEncryptionKmsKey => disk_encryption_kms_key: "disk-encryption-kms-key",
    /// GCP: IOPS at creation.
    ProvisionedIopsOnCreate => provisioned_iops_on_create: "provisioned-iops-on-create",
    /// GCP: throughput at creation.
    ProvisionedThroughputOnCreate => provisioned_throughput_on_create: "provisioned-throughput-on-create",
    /// GCP: `none` or `regional-pd`.
    ReplicationType => replication_type: "replication-type",
    /// Azure: disk kind.
    Kind => kind: "kind",
    /// Azure: host caching mode.
    CachingMode => caching_mode: "cachingMode",
    /// Azure: disk access resource.
    DiskAccessId => disk_access_id: "diskAccessID",
    /// Azure: disk encryption set.
    DiskEncryptionSetId => disk_encryption_set_id: "diskEncryptionSetID",
    /// Azure: encryption type.
    DiskEncryptionType => disk_encryption_type: "diskEncryptionType",
    /// Azure: on-demand bursting.
    EnableBursting => enable_bursting: "enableBursting",
    /// Azure: performance plus.
    EnablePerformancePlus => enable_performance_plus: "enablePerformancePlus",
    /// Azure: network access policy.
    NetworkAccessPolicy => network_access_policy: "networkAccessPolicy",
    /// Azure: CSI provisioner.
    Provisioner => provisioner: "provisioner",
    /// Azure: public network access.
    PublicNetworkAccess => public_network_access: "publicNetworkAccess",
    /// Azure: resource group for disks.
    ResourceGroup => resource_group: "resourceGroup",
    /// Azure: disk SKU.
    SkuName => sku_name: "skuName",
    /// Azure: subscription for disks.
    SubscriptionId => subscription_id: "subscriptionID",
    /// Azure: disk tags, `key=value[,key=value]`.
    Tags => tags: "tags",
}

impl StorageClassParameters {
    /// Parameters that carry a value, in declaration order.
    pub fn set_fields(&self) -> impl Iterator<Item = ScParameter> + '_ {
        ScParameter::ALL
            .iter()
            .copied()
            .filter(|parameter| self.value(*parameter).is_some())
    }

    /// Unrecognized keys that carry a value, in key order.
    pub fn unrecognized_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.unrecognized
            .iter()
            .filter(|(_, value)| match value {
                Value::Null => false,
                Value::String(text) => !text.trim().is_empty(),
                _ => true,
            })
            .map(|(key, _)| key.as_str())
    }

    /// True when no parameter is set, known or not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set_fields().next().is_none() && self.unrecognized_keys().next().is_none()
    }
}

impl fmt::Display for ScParameter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.wire_name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

// Kubernetes parameters are strings, but YAML authors write `iops: 3000`.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Integer(number) => number.to_string(),
        Scalar::Float(number) => number.to_string(),
        Scalar::Flag(flag) => flag.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_fields_reports_only_non_blank_values() {
        let parameters = StorageClassParameters {
            volume_type: Some("gp3".to_string()),
            fs_type: Some(String::new()),
            iops: Some("4000".to_string()),
            ..StorageClassParameters::default()
        };
        let set: Vec<_> = parameters.set_fields().collect();
        assert_eq!(set, vec![ScParameter::Type, ScParameter::Iops]);
        assert!(!parameters.is_empty());
        assert!(StorageClassParameters::default().is_empty());
    }

    #[test]
    fn wire_names_are_unique() {
        let mut names: Vec<_> = ScParameter::ALL.iter().map(|p| p.wire_name()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn scalar_values_deserialize_as_strings() -> Result<(), serde_json::Error> {
        let parameters: StorageClassParameters = serde_json::from_value(serde_json::json!({
            "type": "io2",
            "iops": 20000,
            "encrypted": true,
            "replication-type": "none"
        }))?;
        assert_eq!(parameters.value(ScParameter::Iops), Some("20000"));
        assert_eq!(parameters.value(ScParameter::Encrypted), Some("true"));
        assert_eq!(parameters.value(ScParameter::ReplicationType), Some("none"));
        assert_eq!(parameters.unrecognized_keys().count(), 0);
        Ok(())
    }

    #[test]
    fn misspelled_keys_are_kept_as_unrecognized() -> Result<(), serde_json::Error> {
        let parameters: StorageClassParameters = serde_json::from_value(serde_json::json!({
            "type": "gp3",
            "iopsPerGb": "50",
            "bogus": "x",
            "blank": ""
        }))?;
        assert_eq!(parameters.value(ScParameter::IopsPerGb), None);
        let keys: Vec<_> = parameters.unrecognized_keys().collect();
        assert_eq!(keys, vec!["bogus", "iopsPerGb"]);

        let only_blank: StorageClassParameters =
            serde_json::from_value(serde_json::json!({ "blank": null }))?;
        assert!(only_blank.is_empty());
        Ok(())
    }
}
