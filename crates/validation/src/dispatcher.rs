//! Per-run validator driving the descriptor and secrets phases.

use crate::common::validate_common;
use crate::credentials::{complete_credentials, resolve_provider_credentials};
use crate::error::ValidationError;
use crate::inventory::Inventory;
use crate::providers::{ProviderContext, ProviderRules, azure, rules_for};
use crate::settings::ValidationSettings;
use keos_domain::{ClusterCredentials, ClusterDescriptor, InfraProvider, Secrets, ValidatorKind};
use keos_ports::{CloudMetadataConnector, MetadataOperation, MetadataScope};
use keos_shared::Validated;

/// Validator for one descriptor.
///
/// Built fresh for every run; nothing is shared between runs.
pub struct ClusterValidator<'a> {
    descriptor: &'a ClusterDescriptor,
    secrets: Option<&'a Secrets>,
    settings: &'a ValidationSettings,
    rules: &'static dyn ProviderRules,
}

impl<'a> ClusterValidator<'a> {
    /// Select the rule set for the descriptor's provider and mode.
    #[must_use]
    pub fn new(
        descriptor: &'a ClusterDescriptor,
        secrets: Option<&'a Secrets>,
        settings: &'a ValidationSettings,
    ) -> Self {
        Self {
            descriptor,
            secrets,
            settings,
            rules: rules_for(descriptor.validator_kind()),
        }
    }

    /// Selected rule set.
    #[must_use]
    pub fn kind(&self) -> ValidatorKind {
        self.rules.kind()
    }

    /// Provider-independent rules.
    pub fn validate_descriptor(&self) -> Result<(), ValidationError> {
        tracing::debug!(validator = %self.kind(), "validating descriptor");
        validate_common(&self.descriptor.spec, self.secrets, self.settings)
    }

    /// Resolve credentials, apply the provider rules, then finish resolution.
    pub fn validate_secrets(
        &self,
        connector: &dyn CloudMetadataConnector,
    ) -> Result<Validated<ClusterCredentials>, ValidationError> {
        let spec = &self.descriptor.spec;
        let provider_credentials = resolve_provider_credentials(spec, self.secrets)?;

        let scope = MetadataScope {
            provider: spec.infra_provider,
            region: spec.region.clone(),
            resource_group: (spec.infra_provider == InfraProvider::Azure)
                .then(|| azure::resource_group(spec, &self.descriptor.name).to_string()),
            credentials: provider_credentials.clone(),
        };
        let port = connector
            .connect(&scope)
            .map_err(|error| ValidationError::metadata(scope.provider, MetadataOperation::Connect, error))?;

        let context = ProviderContext {
            spec,
            cluster_name: &self.descriptor.name,
            kind: self.kind(),
            settings: self.settings,
            inventory: Inventory::new(spec.infra_provider, port.as_ref()),
        };
        tracing::debug!(validator = %self.kind(), "applying provider rules");
        self.rules.validate(&context)?;

        let credentials = complete_credentials(spec, self.secrets, provider_credentials)?;
        Ok(Validated::new(credentials))
    }

    /// Both phases in order.
    pub fn validate(
        &self,
        connector: &dyn CloudMetadataConnector,
    ) -> Result<Validated<ClusterCredentials>, ValidationError> {
        self.validate_descriptor()?;
        self.validate_secrets(connector)
    }
}
