//! Credential blocks shared by the descriptor and the secrets document.

use crate::credentials::{CredentialField, ProviderCredentials};
use crate::provider::InfraProvider;
use serde::{Deserialize, Serialize};

/// A typed provider credential block.
pub trait CredentialBlock {
    /// Provider owning the block.
    const PROVIDER: InfraProvider;

    /// Value of a field of this block; empty for foreign fields.
    fn field(&self, field: CredentialField) -> &str;

    /// `(field, value)` pairs in document order.
    fn pairs(&self) -> Vec<(CredentialField, &str)> {
        CredentialField::provider_fields(Self::PROVIDER)
            .iter()
            .map(|field| (*field, self.field(*field)))
            .collect()
    }

    /// True when every field is blank.
    fn is_zero(&self) -> bool {
        self.pairs().iter().all(|(_, value)| value.trim().is_empty())
    }

    /// First blank field, if any.
    fn first_missing(&self) -> Option<CredentialField> {
        self.pairs()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
    }

    /// Convert to the field-keyed form.
    fn to_provider_credentials(&self) -> ProviderCredentials {
        ProviderCredentials::from_pairs(self.pairs())
    }
}

/// AWS IAM credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    /// Access key id.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Default region.
    #[serde(default)]
    pub region: String,
    /// Account id.
    #[serde(default)]
    pub account_id: String,
}

impl CredentialBlock for AwsCredentials {
    const PROVIDER: InfraProvider = InfraProvider::Aws;

    fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::AccessKey => &self.access_key,
            CredentialField::SecretKey => &self.secret_key,
            CredentialField::Region => &self.region,
            CredentialField::AccountId => &self.account_id,
            _ => "",
        }
    }
}

/// GCP service-account credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpCredentials {
    /// Project id.
    #[serde(default)]
    pub project_id: String,
    /// Key id.
    #[serde(default)]
    pub private_key_id: String,
    /// PEM private key.
    #[serde(default)]
    pub private_key: String,
    /// Service-account email.
    #[serde(default)]
    pub client_email: String,
    /// Client id.
    #[serde(default)]
    pub client_id: String,
}

impl CredentialBlock for GcpCredentials {
    const PROVIDER: InfraProvider = InfraProvider::Gcp;

    fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::ProjectId => &self.project_id,
            CredentialField::PrivateKeyId => &self.private_key_id,
            CredentialField::PrivateKey => &self.private_key,
            CredentialField::ClientEmail => &self.client_email,
            CredentialField::ClientId => &self.client_id,
            _ => "",
        }
    }
}

/// Azure service-principal credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureCredentials {
    /// Subscription id.
    #[serde(default)]
    pub subscription_id: String,
    /// Tenant id.
    #[serde(default)]
    pub tenant_id: String,
    /// Application id.
    #[serde(default)]
    pub client_id: String,
    /// Application secret.
    #[serde(default)]
    pub client_secret: String,
}

impl CredentialBlock for AzureCredentials {
    const PROVIDER: InfraProvider = InfraProvider::Azure;

    fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::SubscriptionId => &self.subscription_id,
            CredentialField::TenantId => &self.tenant_id,
            CredentialField::ClientId => &self.client_id,
            CredentialField::ClientSecret => &self.client_secret,
            _ => "",
        }
    }
}

/// Login for one registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerRegistryCredentials {
    /// Registry URL.
    #[serde(default)]
    pub url: String,
    /// User name.
    #[serde(default)]
    pub user: String,
    /// Password or token.
    #[serde(default)]
    pub pass: String,
}

/// Inline credentials of the descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// AWS block.
    #[serde(default)]
    pub aws: Option<AwsCredentials>,
    /// GCP block.
    #[serde(default)]
    pub gcp: Option<GcpCredentials>,
    /// Azure block.
    #[serde(default)]
    pub azure: Option<AzureCredentials>,
    /// GitHub token.
    #[serde(default)]
    pub github_token: Option<String>,
    /// Registry logins.
    #[serde(default)]
    pub docker_registries: Vec<DockerRegistryCredentials>,
}

impl Credentials {
    /// Providers whose block is present and not all-zero.
    #[must_use]
    pub fn populated_providers(&self) -> Vec<InfraProvider> {
        let mut populated = Vec::new();
        if self.aws.as_ref().is_some_and(|block| !block.is_zero()) {
            populated.push(InfraProvider::Aws);
        }
        if self.gcp.as_ref().is_some_and(|block| !block.is_zero()) {
            populated.push(InfraProvider::Gcp);
        }
        if self.azure.as_ref().is_some_and(|block| !block.is_zero()) {
            populated.push(InfraProvider::Azure);
        }
        populated
    }
}

/// Provider block wrapper of the secrets document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSecret<T> {
    /// The credential block.
    #[serde(default)]
    pub credentials: T,
}

/// Clear-text secrets document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets {
    /// AWS block.
    #[serde(default)]
    pub aws: Option<ProviderSecret<AwsCredentials>>,
    /// GCP block.
    #[serde(default)]
    pub gcp: Option<ProviderSecret<GcpCredentials>>,
    /// Azure block.
    #[serde(default)]
    pub azure: Option<ProviderSecret<AzureCredentials>>,
    /// GitHub token.
    #[serde(default)]
    pub github_token: Option<String>,
    /// Login for the primary registry, when managed outside the list.
    #[serde(default)]
    pub external_registry: Option<DockerRegistryCredentials>,
    /// Registry logins.
    #[serde(default)]
    pub docker_registries: Vec<DockerRegistryCredentials>,
}
