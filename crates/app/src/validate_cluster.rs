//! Validate a cluster descriptor and resolve its credentials.

use keos_config::ValidatedEngineConfig;
use keos_domain::{ClusterCredentials, ClusterDescriptor, Secrets, ValidatorKind};
use keos_ports::{CloudMetadataConnector, LoggerPort};
use keos_shared::{ErrorEnvelope, Result};
use keos_validation::{ClusterValidator, ValidationSettings};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Input payload for one validation run.
#[derive(Debug, Clone)]
pub struct ValidateClusterInput {
    /// Parsed cluster descriptor.
    pub descriptor: ClusterDescriptor,
    /// Parsed secrets document, when one was supplied.
    pub secrets: Option<Secrets>,
}

/// Dependencies required by validate-cluster.
#[derive(Clone)]
pub struct ValidateClusterDeps {
    /// Builds the inventory client for the run.
    pub connector: Arc<dyn CloudMetadataConnector>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Run-wide settings.
    pub settings: ValidationSettings,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateClusterOutput {
    /// Rule set that accepted the descriptor.
    pub kind: ValidatorKind,
    /// Resolved credentials.
    pub credentials: ClusterCredentials,
}

/// Validation settings derived from the engine configuration.
#[must_use]
pub fn settings_from_config(config: &ValidatedEngineConfig) -> ValidationSettings {
    ValidationSettings::new(config.supported_k8s_versions())
}

/// Run the descriptor phase, then the secrets phase.
pub fn validate_cluster(
    deps: &ValidateClusterDeps,
    input: &ValidateClusterInput,
) -> Result<ValidateClusterOutput> {
    let started_at = Instant::now();
    let validator = ClusterValidator::new(&input.descriptor, input.secrets.as_ref(), &deps.settings);
    let kind = validator.kind();
    let logger = deps
        .logger
        .as_ref()
        .map(|logger| logger.child(log_fields_run(kind)));

    if let Some(logger) = logger.as_ref() {
        logger.info(
            "keos.validate.start",
            "Cluster validation started",
            Some(log_fields_start(&input.descriptor)),
        );
    }

    let result = run_phases(deps, &validator, logger.as_deref(), started_at);

    match result {
        Ok(credentials) => {
            if let Some(logger) = logger.as_ref() {
                logger.info(
                    "keos.validate.completed",
                    "Cluster validation completed",
                    Some(log_fields_duration(started_at)),
                );
            }
            Ok(ValidateClusterOutput { kind, credentials })
        },
        Err(error) => {
            tracing::debug!(validator = %kind, code = %error.code, "cluster validation failed");
            if let Some(logger) = logger.as_ref() {
                logger.error(
                    "keos.validate.failed",
                    "Cluster validation failed",
                    Some(log_fields_error(started_at, &error)),
                    serde_json::to_value(&error).ok(),
                );
            }
            Err(error)
        },
    }
}

fn run_phases(
    deps: &ValidateClusterDeps,
    validator: &ClusterValidator<'_>,
    logger: Option<&dyn LoggerPort>,
    started_at: Instant,
) -> Result<ClusterCredentials> {
    validator.validate_descriptor()?;
    if let Some(logger) = logger {
        logger.debug(
            "keos.validate.descriptor.completed",
            "Descriptor rules passed",
            Some(log_fields_duration(started_at)),
        );
    }

    let credentials = validator
        .validate_secrets(deps.connector.as_ref())?
        .into_inner();
    if let Some(logger) = logger {
        logger.debug(
            "keos.validate.provider.completed",
            "Provider rules passed",
            Some(log_fields_duration(started_at)),
        );
        logger.info(
            "keos.validate.credentials.resolved",
            "Credentials resolved",
            Some(log_fields_credentials(&credentials)),
        );
    }
    Ok(credentials)
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn log_fields_run(kind: ValidatorKind) -> BTreeMap<Box<str>, Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "provider".to_owned().into_boxed_str(),
        Value::String(kind.provider().as_str().to_owned()),
    );
    fields.insert(
        "managed".to_owned().into_boxed_str(),
        Value::Bool(kind.is_managed()),
    );
    fields.insert(
        "validator".to_owned().into_boxed_str(),
        Value::String(kind.as_str().to_owned()),
    );
    fields
}

fn log_fields_start(descriptor: &ClusterDescriptor) -> BTreeMap<Box<str>, Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "clusterName".to_owned().into_boxed_str(),
        Value::String(descriptor.name.clone()),
    );
    fields.insert(
        "region".to_owned().into_boxed_str(),
        Value::String(descriptor.spec.region.clone()),
    );
    fields
}

fn log_fields_duration(started_at: Instant) -> BTreeMap<Box<str>, Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "durationMs".to_owned().into_boxed_str(),
        Value::from(duration_ms(started_at)),
    );
    fields
}

fn log_fields_credentials(credentials: &ClusterCredentials) -> BTreeMap<Box<str>, Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "registryCount".to_owned().into_boxed_str(),
        Value::from(credentials.docker_registries.len()),
    );
    fields.insert(
        "keosRegistryAuth".to_owned().into_boxed_str(),
        Value::Bool(credentials.keos_registry.is_some()),
    );
    fields
}

fn log_fields_error(started_at: Instant, error: &ErrorEnvelope) -> BTreeMap<Box<str>, Value> {
    let mut fields = log_fields_duration(started_at);
    fields.insert(
        "errorCode".to_owned().into_boxed_str(),
        Value::String(error.code.to_string()),
    );
    fields
}
