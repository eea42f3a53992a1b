//! Validation runs wired with the real config parsers and adapters.

use keos_adapters::{BufferLogSink, InventorySnapshot, JsonLogger, OfflineConnector};
use keos_app::{ValidateClusterDeps, ValidateClusterInput, settings_from_config, validate_cluster};
use keos_config::{DocumentFormat, EngineEnv, apply_env_overrides, parse_descriptor, parse_secrets};
use keos_config::{ENV_SUPPORTED_K8S_VERSIONS, EngineConfig};
use keos_domain::{InfraProvider, KeyCase, ValidatorKind};
use keos_shared::ErrorCode;
use keos_testkit::fixtures::{AWS_EKS_YAML, AWS_SECRETS_YAML};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

fn input() -> Result<ValidateClusterInput, Box<dyn Error>> {
    Ok(ValidateClusterInput {
        descriptor: parse_descriptor(AWS_EKS_YAML, DocumentFormat::Yaml)?,
        secrets: Some(parse_secrets(AWS_SECRETS_YAML, DocumentFormat::Yaml)?),
    })
}

fn lines(sink: &BufferLogSink) -> Result<Vec<Value>, Box<dyn Error>> {
    sink.take()
        .iter()
        .map(|line| serde_json::from_str(line.trim()).map_err(Into::into))
        .collect()
}

#[test]
fn offline_run_resolves_credentials_and_logs_json() -> Result<(), Box<dyn Error>> {
    let sink = Arc::new(BufferLogSink::new());
    let logger = JsonLogger::new(sink.clone());
    let config = EngineConfig::default().validate_and_normalize()?;
    let deps = ValidateClusterDeps {
        connector: Arc::new(OfflineConnector::new()),
        logger: Some(Arc::new(logger)),
        settings: settings_from_config(&config),
    };

    let output = validate_cluster(&deps, &input()?)?;
    assert_eq!(output.kind, ValidatorKind::AwsManaged);

    let flattened = output.credentials.flatten(KeyCase::Snake);
    assert_eq!(
        flattened.provider.get("access_key").map(String::as_str),
        Some("AKIAFIXTURE")
    );
    assert_eq!(
        flattened.keos_registry.get("user").map(String::as_str),
        Some("keos-robot")
    );

    let events = lines(&sink)?;
    let names: Vec<&str> = events
        .iter()
        .filter_map(|event| event.get("event").and_then(Value::as_str))
        .collect();
    assert_eq!(
        names,
        vec![
            "keos.validate.start",
            "keos.validate.credentials.resolved",
            "keos.validate.completed",
        ]
    );
    let rendered = serde_json::to_string(&events)?;
    assert!(!rendered.contains("fixture-secret-key"));
    assert!(!rendered.contains("fixture-registry-pass"));
    Ok(())
}

#[test]
fn supported_versions_come_from_the_environment() -> Result<(), Box<dyn Error>> {
    let mut env = BTreeMap::new();
    env.insert(ENV_SUPPORTED_K8S_VERSIONS.to_string(), "1.27,1.28".to_string());
    let config = apply_env_overrides(EngineConfig::default(), &EngineEnv::from_map(&env)?)?;
    let deps = ValidateClusterDeps {
        connector: Arc::new(OfflineConnector::new()),
        logger: None,
        settings: settings_from_config(&config),
    };

    let result = validate_cluster(&deps, &input()?);
    assert!(matches!(
        result,
        Err(ref error) if error.code == ErrorCode::validation("invalid_value")
    ));
    Ok(())
}

#[test]
fn snapshot_inventory_rejects_an_unknown_region() -> Result<(), Box<dyn Error>> {
    let snapshot = InventorySnapshot {
        regions: vec!["us-east-1".to_string()],
        ..InventorySnapshot::default()
    };
    let deps = ValidateClusterDeps {
        connector: Arc::new(OfflineConnector::new().with_snapshot(InfraProvider::Aws, snapshot)),
        logger: None,
        settings: settings_from_config(&EngineConfig::default().validate_and_normalize()?),
    };

    let error = validate_cluster(&deps, &input()?)
        .err()
        .ok_or_else(|| std::io::Error::other("expected an unknown region"))?;
    assert!(error.to_string().contains("eu-west-1 region does not exist"));
    Ok(())
}
