//! End-to-end validation of fixture descriptors against in-memory inventory.

use keos_domain::{
    ClusterDescriptor, DockerRegistry, ExtraVolume, InfraProvider, ProviderSecret, RegistryType,
    Secrets, ValidatorKind,
};
use keos_ports::MetadataOperation;
use keos_shared::{ErrorCode, ErrorEnvelope, ErrorKind};
use keos_testkit::errors::{permission_denied_error, throttled_error};
use keos_testkit::fixtures::{
    CLUSTER_NAME, aws_credentials, cloud_metadata, descriptor, registry_login, secrets, worker,
};
use keos_testkit::in_memory::{InMemoryCloudMetadata, InMemoryConnector};
use keos_validation::{
    ClusterValidator, ValidationError, ValidationSettings, resolve_provider_credentials,
    validate_pods_cidr,
};
use std::error::Error;

fn run(
    descriptor: &ClusterDescriptor,
    secrets: Option<&Secrets>,
    metadata: InMemoryCloudMetadata,
) -> Result<ValidatorKind, ValidationError> {
    let settings = ValidationSettings::default();
    let validator = ClusterValidator::new(descriptor, secrets, &settings);
    let connector = InMemoryConnector::new(metadata);
    validator.validate(&connector)?;
    Ok(validator.kind())
}

fn run_fixture(descriptor: &ClusterDescriptor) -> Result<ValidatorKind, ValidationError> {
    let kind = descriptor.validator_kind();
    let secrets = secrets(kind.provider());
    run(descriptor, Some(&secrets), cloud_metadata(kind))
}

fn expect_error<T>(result: Result<T, ValidationError>) -> Result<ValidationError, Box<dyn Error>> {
    result
        .err()
        .ok_or_else(|| std::io::Error::other("expected validation to fail").into())
}

#[test]
fn every_fixture_kind_validates() -> Result<(), Box<dyn Error>> {
    for kind in ValidatorKind::ALL {
        let fixture = descriptor(kind);
        assert_eq!(run_fixture(&fixture)?, kind);
    }
    Ok(())
}

#[test]
fn resolved_credentials_flag_the_primary_registry() -> Result<(), Box<dyn Error>> {
    let fixture = descriptor(ValidatorKind::GcpManaged);
    let secrets = secrets(InfraProvider::Gcp);
    let settings = ValidationSettings::default();
    let connector = InMemoryConnector::new(cloud_metadata(ValidatorKind::GcpManaged));

    let credentials = ClusterValidator::new(&fixture, Some(&secrets), &settings)
        .validate(&connector)?
        .into_inner();

    assert_eq!(credentials.provider, InfraProvider::Gcp);
    let keos = credentials
        .keos_registry
        .ok_or_else(|| std::io::Error::other("missing keos registry credential"))?;
    assert!(keos.keos_registry);
    assert_eq!(keos.user, "keos-robot");
    assert_eq!(credentials.github_token.expose(), "ghp_fixture0123456789");
    Ok(())
}

#[test]
fn version_outside_supported_window_fails() -> Result<(), Box<dyn Error>> {
    let mut fixture = descriptor(ValidatorKind::AwsUnmanaged);
    fixture.spec.k8s_version = "v1.22.4".to_string();

    let error = expect_error(run_fixture(&fixture))?;
    assert_eq!(error.error_code(), ErrorCode::validation("invalid_value"));
    assert!(error.to_string().starts_with("spec: Invalid value: \"k8s_version\""));
    Ok(())
}

#[test]
fn tainted_or_spot_only_pools_need_a_clean_node() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AwsUnmanaged;
    let mut fixture = descriptor(kind);
    let mut spot = worker(kind, "spot-pool");
    spot.spot = true;
    let mut tainted = worker(kind, "tainted-pool");
    tainted.taints = vec!["dedicated=gpu:NoSchedule".to_string()];
    fixture.spec.worker_nodes = vec![spot, tainted];

    let error = expect_error(run_fixture(&fixture))?;
    assert!(
        error
            .to_string()
            .contains("at least one worker node must be non-spot and without taints")
    );

    fixture.spec.worker_nodes.push(worker(kind, "system-pool"));
    assert_eq!(run_fixture(&fixture)?, kind);
    Ok(())
}

#[test]
fn duplicated_worker_names_name_the_node() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::GcpUnmanaged;
    let mut fixture = descriptor(kind);
    fixture.spec.worker_nodes.push(worker(kind, "worker-1"));

    let error = expect_error(run_fixture(&fixture))?;
    assert!(error.to_string().contains("`worker-1` is duplicated"));
    Ok(())
}

#[test]
fn pods_cidr_must_be_a_large_enough_reserved_range() {
    assert!(validate_pods_cidr("100.64.0.0/24").is_ok());
    assert!(validate_pods_cidr("203.0.113.0/24").is_err());
    assert!(validate_pods_cidr("100.64.0.0/30").is_err());
}

#[test]
fn self_managed_aws_applies_the_pods_cidr_ranges() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AwsUnmanaged;
    let mut fixture = descriptor(kind);
    fixture.spec.networks.pods_cidr = Some("100.64.0.0/24".to_string());
    assert_eq!(run_fixture(&fixture)?, kind);

    for cidr in ["203.0.113.0/24", "100.64.0.0/30"] {
        fixture.spec.networks.pods_cidr = Some(cidr.to_string());
        let error = expect_error(run_fixture(&fixture))?;
        assert_eq!(error.error_code(), ErrorCode::validation("invalid_value"), "{cidr}");
    }
    Ok(())
}

#[test]
fn managed_worker_volumes_must_be_unique() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AwsManaged;
    let mut fixture = descriptor(kind);
    let volume = ExtraVolume {
        label: Some("data".to_string()),
        mount_path: Some("/data".to_string()),
        device_name: Some("/dev/xvdb".to_string()),
        ..ExtraVolume::default()
    };
    if let Some(first) = fixture.spec.worker_nodes.first_mut() {
        first.extra_volumes = vec![volume.clone(), volume];
    }

    let error = expect_error(run_fixture(&fixture))?;
    assert!(error.to_string().contains("`data` is duplicated"));
    Ok(())
}

#[test]
fn repeated_identical_registry_logins_are_ambiguous() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AwsUnmanaged;
    let fixture = descriptor(kind);
    let mut repeated = secrets(InfraProvider::Aws);
    repeated
        .docker_registries
        .push(registry_login(InfraProvider::Aws, "keos-robot"));

    let error = expect_error(run(&fixture, Some(&repeated), cloud_metadata(kind)))?;
    assert_eq!(error.error_code(), ErrorCode::validation("invariant"));
    Ok(())
}

#[test]
fn unknown_storage_class_parameters_are_rejected() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AwsUnmanaged;
    let mut fixture = descriptor(kind);
    fixture.spec.storage_class.parameters = serde_json::from_value(serde_json::json!({
        "iopsPerGb": "50",
        "bogus": "x"
    }))?;

    let error = expect_error(run_fixture(&fixture))?;
    assert_eq!(error.path(), Some("spec.storageclass.parameters"));
    assert!(error.to_string().contains("\"bogus\""));
    Ok(())
}

#[test]
fn storage_class_parameters_follow_the_provider_allow_list() -> Result<(), Box<dyn Error>> {
    let mut fixture = descriptor(ValidatorKind::AwsManaged);
    fixture.spec.storage_class.parameters.volume_type = Some("gp3".to_string());
    assert_eq!(run_fixture(&fixture)?, ValidatorKind::AwsManaged);

    fixture.spec.storage_class.parameters.replication_type = Some("regional-pd".to_string());
    let error = expect_error(run_fixture(&fixture))?;
    assert_eq!(error.path(), Some("spec.storageclass.parameters"));
    assert!(error.to_string().contains("replication-type"));
    Ok(())
}

#[test]
fn secrets_take_precedence_over_inline_credentials() -> Result<(), Box<dyn Error>> {
    let mut fixture = descriptor(ValidatorKind::AwsManaged);
    let mut inline = aws_credentials();
    inline.access_key = "AKIAINLINE".to_string();
    fixture.spec.credentials.aws = Some(inline);

    let from_descriptor = resolve_provider_credentials(&fixture.spec, Some(&Secrets::default()))?;
    assert_eq!(
        from_descriptor.get(keos_domain::CredentialField::AccessKey),
        Some("AKIAINLINE")
    );

    let secrets = Secrets {
        aws: Some(ProviderSecret {
            credentials: aws_credentials(),
        }),
        ..Secrets::default()
    };
    let from_secrets = resolve_provider_credentials(&fixture.spec, Some(&secrets))?;
    assert_eq!(
        from_secrets.get(keos_domain::CredentialField::AccessKey),
        Some("AKIAFIXTURE")
    );

    fixture.spec.credentials.aws = None;
    let error = expect_error(resolve_provider_credentials(&fixture.spec, None))?;
    assert_eq!(error.error_code(), ErrorCode::validation("missing_credentials"));
    Ok(())
}

#[test]
fn ambiguous_registry_logins_fail() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AzureManaged;
    let mut fixture = descriptor(kind);
    fixture.spec.docker_registries.push(DockerRegistry {
        url: "keosmirror.azurecr.io/keos".to_string(),
        registry_type: RegistryType::Acr,
        auth_required: false,
        keos_registry: false,
    });

    let single = secrets(InfraProvider::Azure);
    let metadata = cloud_metadata(kind);
    assert_eq!(run(&fixture, Some(&single), metadata.clone())?, kind);

    let mut ambiguous = single;
    ambiguous
        .docker_registries
        .push(registry_login(InfraProvider::Azure, "another-robot"));
    let error = expect_error(run(&fixture, Some(&ambiguous), metadata))?;
    assert_eq!(error.error_code(), ErrorCode::validation("invariant"));
    Ok(())
}

#[test]
fn empty_inventory_skips_cross_checks() -> Result<(), Box<dyn Error>> {
    let mut fixture = descriptor(ValidatorKind::AwsManaged);
    fixture.spec.region = "ap-south-2".to_string();
    let secrets = secrets(InfraProvider::Aws);

    let kind = run(&fixture, Some(&secrets), InMemoryCloudMetadata::new())?;
    assert_eq!(kind, ValidatorKind::AwsManaged);
    Ok(())
}

#[test]
fn unknown_region_fails_when_inventory_is_known() -> Result<(), Box<dyn Error>> {
    let mut fixture = descriptor(ValidatorKind::GcpManaged);
    fixture.spec.region = "mars-north1".to_string();

    let error = expect_error(run_fixture(&fixture))?;
    assert!(error.to_string().contains("mars-north1 region does not exist"));
    Ok(())
}

#[test]
fn metadata_failures_are_fatal_and_keep_their_class() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AwsManaged;
    let fixture = descriptor(kind);
    let secrets = secrets(InfraProvider::Aws);
    let metadata = cloud_metadata(kind).failing(MetadataOperation::ListRegions, throttled_error());

    let error = expect_error(run(&fixture, Some(&secrets), metadata))?;
    assert!(matches!(
        error,
        ValidationError::Metadata {
            operation: MetadataOperation::ListRegions,
            ..
        }
    ));
    let envelope = ErrorEnvelope::from(error);
    assert_eq!(envelope.kind, ErrorKind::Unexpected);
    assert!(envelope.class.is_retriable());
    assert_eq!(
        envelope.metadata.get("operation").map(String::as_str),
        Some("list_regions")
    );
    Ok(())
}

#[test]
fn connector_failures_are_reported_as_connect() -> Result<(), Box<dyn Error>> {
    let fixture = descriptor(ValidatorKind::GcpUnmanaged);
    let secrets = secrets(InfraProvider::Gcp);
    let settings = ValidationSettings::default();
    let connector = InMemoryConnector::failing(permission_denied_error());

    let error = expect_error(
        ClusterValidator::new(&fixture, Some(&secrets), &settings).validate(&connector),
    )?;
    assert!(matches!(
        error,
        ValidationError::Metadata {
            provider: InfraProvider::Gcp,
            operation: MetadataOperation::Connect,
            ..
        }
    ));
    Ok(())
}

#[test]
fn azure_scope_defaults_resource_group_to_cluster_name() -> Result<(), Box<dyn Error>> {
    let kind = ValidatorKind::AzureUnmanaged;
    let fixture = descriptor(kind);
    let secrets = secrets(InfraProvider::Azure);
    let settings = ValidationSettings::default();
    let connector = InMemoryConnector::new(cloud_metadata(kind));

    ClusterValidator::new(&fixture, Some(&secrets), &settings).validate(&connector)?;

    let scopes = connector.scopes();
    assert_eq!(scopes.len(), 1);
    let scope = scopes
        .first()
        .ok_or_else(|| std::io::Error::other("missing scope"))?;
    assert_eq!(scope.resource_group.as_deref(), Some(CLUSTER_NAME));
    assert_eq!(scope.region, "westeurope");
    Ok(())
}

#[test]
fn descriptor_phase_does_not_touch_the_inventory() -> Result<(), Box<dyn Error>> {
    let fixture = descriptor(ValidatorKind::AwsManaged);
    let secrets = secrets(InfraProvider::Aws);
    let settings = ValidationSettings::default();

    ClusterValidator::new(&fixture, Some(&secrets), &settings).validate_descriptor()?;
    Ok(())
}
