//! # keos-testkit
//!
//! Test helpers, in-memory adapters and descriptor fixtures.
//! This crate depends on `domain`, `ports` and `shared`.

pub mod errors;
pub mod fixtures;
pub mod in_memory;

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use keos_domain::{InfraProvider, ValidatorKind};
    use keos_ports::{CloudMetadataConnector, CloudMetadataPort, MetadataOperation, MetadataScope};

    #[test]
    fn testkit_crate_compiles() {
        let version = testkit_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn error_fixtures_are_available() {
        let codes = errors::metadata_error_codes();
        assert!(!codes.is_empty());
        assert!(errors::throttled_error().class.is_retriable());
    }

    #[test]
    fn fixtures_cover_every_kind() {
        for kind in ValidatorKind::ALL {
            let descriptor = fixtures::descriptor(kind);
            assert_eq!(descriptor.validator_kind(), kind);
        }
    }

    #[test]
    fn unset_inventory_answers_no_data() {
        let metadata = in_memory::InMemoryCloudMetadata::new();
        assert!(metadata.list_vpcs().unwrap().is_empty());
        assert_eq!(metadata.calls(), vec![MetadataOperation::ListVpcs]);
    }

    #[test]
    fn injected_failures_are_returned() {
        let metadata = in_memory::InMemoryCloudMetadata::new()
            .with_regions(&["eu-west-1"])
            .failing(MetadataOperation::ListRegions, errors::timeout_error());
        assert!(metadata.list_regions().is_err());
    }

    #[test]
    fn private_subnet_zones_are_distinct() {
        let metadata = in_memory::InMemoryCloudMetadata::new()
            .with_private_subnet("subnet-a", "eu-west-1a")
            .with_private_subnet("subnet-b", "eu-west-1a")
            .with_private_subnet("subnet-c", "eu-west-1b");
        let ids = ["subnet-a", "subnet-b", "subnet-c"].map(str::to_string);
        let zones = metadata.list_private_subnet_zones(&ids).unwrap();
        assert_eq!(zones, vec!["eu-west-1a".to_string(), "eu-west-1b".to_string()]);
    }

    #[test]
    fn connector_records_scopes() {
        let connector = in_memory::InMemoryConnector::new(fixtures::cloud_metadata(ValidatorKind::AwsManaged));
        let scope = MetadataScope {
            provider: InfraProvider::Aws,
            region: "eu-west-1".to_string(),
            resource_group: None,
            credentials: keos_domain::ProviderCredentials::default(),
        };
        let port = connector.connect(&scope).unwrap();
        assert_eq!(port.list_regions().unwrap().first().map(String::as_str), Some("eu-west-1"));
        assert_eq!(connector.scopes(), vec![scope]);
    }
}
