//! Integration tests for parsing descriptor and secrets fixtures from the testkit.

use keos_config::{DocumentFormat, parse_descriptor, parse_secrets};
use keos_domain::{InfraProvider, RegistryType, ScParameter, ValidatorKind, ZoneDistribution};
use keos_testkit::fixtures::{AWS_EKS_YAML, AWS_SECRETS_YAML, AZURE_UNMANAGED_YAML, CLUSTER_NAME};
use std::error::Error;

#[test]
fn parses_eks_fixture_with_defaults() -> Result<(), Box<dyn Error>> {
    let descriptor = parse_descriptor(AWS_EKS_YAML, DocumentFormat::Yaml)?;

    assert_eq!(descriptor.name, CLUSTER_NAME);
    assert_eq!(descriptor.validator_kind(), ValidatorKind::AwsManaged);
    assert!(descriptor.spec.control_plane.highly_available);

    let names: Vec<&str> = descriptor
        .spec
        .worker_nodes
        .iter()
        .map(|worker| worker.name.as_str())
        .collect();
    assert_eq!(names, vec!["worker-1", "gpu-pool"]);

    let gpu = descriptor
        .spec
        .worker_nodes
        .iter()
        .find(|worker| worker.name == "gpu-pool")
        .ok_or_else(|| std::io::Error::other("missing gpu-pool"))?;
    assert_eq!(gpu.zone_distribution, Some(ZoneDistribution::Unbalanced));
    assert_eq!(gpu.root_volume.size, 0);

    let parameters = &descriptor.spec.storage_class.parameters;
    assert_eq!(parameters.value(ScParameter::Iops), Some("4000"));
    assert_eq!(parameters.value(ScParameter::FsType), Some("ext4"));

    let keos = descriptor
        .spec
        .keos_registry()
        .ok_or_else(|| std::io::Error::other("missing keos registry"))?;
    assert_eq!(keos.registry_type, RegistryType::Ecr);
    assert!(keos.auth_required);
    Ok(())
}

#[test]
fn parses_azure_fixture_with_inline_credentials() -> Result<(), Box<dyn Error>> {
    let descriptor = parse_descriptor(AZURE_UNMANAGED_YAML, DocumentFormat::Yaml)?;

    assert_eq!(descriptor.validator_kind(), ValidatorKind::AzureUnmanaged);
    assert_eq!(
        descriptor.spec.networks.resource_group.as_deref(),
        Some("keos-network")
    );
    assert_eq!(
        descriptor.spec.credentials.populated_providers(),
        vec![InfraProvider::Azure]
    );
    assert_eq!(descriptor.spec.credentials.docker_registries.len(), 1);
    Ok(())
}

#[test]
fn json_and_yaml_descriptors_agree() -> Result<(), Box<dyn Error>> {
    let from_yaml = parse_descriptor(AWS_EKS_YAML, DocumentFormat::Yaml)?;
    let value: serde_json::Value = serde_yaml_ng::from_str(AWS_EKS_YAML)?;
    let from_json = parse_descriptor(&value.to_string(), DocumentFormat::Json)?;
    assert_eq!(from_yaml, from_json);
    Ok(())
}

#[test]
fn parses_secrets_fixture() -> Result<(), Box<dyn Error>> {
    let secrets = parse_secrets(AWS_SECRETS_YAML, DocumentFormat::Yaml)?;

    let aws = secrets
        .aws
        .as_ref()
        .ok_or_else(|| std::io::Error::other("missing aws block"))?;
    assert_eq!(aws.credentials.account_id, "123456789012");
    assert!(secrets.gcp.is_none());
    assert_eq!(secrets.github_token.as_deref(), Some("ghp_fixture0123456789"));
    assert_eq!(secrets.docker_registries.len(), 1);
    Ok(())
}
