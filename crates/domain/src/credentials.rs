//! Credential field table and the resolved credential output.
//!
//! Key casing for downstream consumers is driven by [`CredentialField`]:
//! every field has exactly one snake form and one camel form, and nothing
//! converts case at runtime.

use crate::provider::InfraProvider;
use keos_shared::{SecretString, redact_map};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Flat string map handed to downstream consumers.
pub type CredentialMap = BTreeMap<String, String>;

/// Key casing expected by a credential consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCase {
    /// `access_key`, as stored in the secrets document.
    Snake,
    /// `AccessKey`, as consumed by provisioning templates.
    Camel,
}

/// Every credential field known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialField {
    /// AWS access key id.
    AccessKey,
    /// AWS secret access key.
    SecretKey,
    /// AWS region.
    Region,
    /// AWS account id.
    AccountId,
    /// GCP project id.
    ProjectId,
    /// GCP service-account key id.
    PrivateKeyId,
    /// GCP service-account private key.
    PrivateKey,
    /// GCP service-account email.
    ClientEmail,
    /// GCP/Azure client id.
    ClientId,
    /// Azure subscription id.
    SubscriptionId,
    /// Azure tenant id.
    TenantId,
    /// Azure client secret.
    ClientSecret,
    /// Registry URL.
    Url,
    /// Registry user.
    User,
    /// Registry password.
    Pass,
}

/// `(field, snake, camel)` rows.
const KEY_TABLE: &[(CredentialField, &str, &str)] = &[
    (CredentialField::AccessKey, "access_key", "AccessKey"),
    (CredentialField::SecretKey, "secret_key", "SecretKey"),
    (CredentialField::Region, "region", "Region"),
    (CredentialField::AccountId, "account_id", "AccountID"),
    (CredentialField::ProjectId, "project_id", "ProjectID"),
    (CredentialField::PrivateKeyId, "private_key_id", "PrivateKeyID"),
    (CredentialField::PrivateKey, "private_key", "PrivateKey"),
    (CredentialField::ClientEmail, "client_email", "ClientEmail"),
    (CredentialField::ClientId, "client_id", "ClientID"),
    (CredentialField::SubscriptionId, "subscription_id", "SubscriptionID"),
    (CredentialField::TenantId, "tenant_id", "TenantID"),
    (CredentialField::ClientSecret, "client_secret", "ClientSecret"),
    (CredentialField::Url, "url", "URL"),
    (CredentialField::User, "user", "User"),
    (CredentialField::Pass, "pass", "Pass"),
];

/// Flag key added to per-registry maps.
pub const KEOS_REGISTRY_KEY: &str = "keos_registry";

impl CredentialField {
    /// Key of this field in the requested casing.
    #[must_use]
    pub fn key(self, case: KeyCase) -> &'static str {
        KEY_TABLE
            .iter()
            .find(|(field, _, _)| *field == self)
            .map_or("", |(_, snake, camel)| match case {
                KeyCase::Snake => *snake,
                KeyCase::Camel => *camel,
            })
    }

    /// Reverse lookup from any casing.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        KEY_TABLE
            .iter()
            .find(|(_, snake, camel)| *snake == key || *camel == key)
            .map(|(field, _, _)| *field)
    }

    /// Fields making up a provider credential block, in document order.
    #[must_use]
    pub const fn provider_fields(provider: InfraProvider) -> &'static [Self] {
        match provider {
            InfraProvider::Aws => &[Self::AccessKey, Self::SecretKey, Self::Region, Self::AccountId],
            InfraProvider::Gcp => &[
                Self::ProjectId,
                Self::PrivateKeyId,
                Self::PrivateKey,
                Self::ClientEmail,
                Self::ClientId,
            ],
            InfraProvider::Azure => &[
                Self::SubscriptionId,
                Self::TenantId,
                Self::ClientId,
                Self::ClientSecret,
            ],
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key(KeyCase::Snake))
    }
}

/// Credentials for one provider, keyed by field.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    values: BTreeMap<CredentialField, String>,
}

impl ProviderCredentials {
    /// Build from `(field, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (CredentialField, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(field, value)| (field, value.to_string()))
                .collect(),
        }
    }

    /// Value of a field, if present.
    #[must_use]
    pub fn get(&self, field: CredentialField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Render as a flat map in the requested casing.
    #[must_use]
    pub fn to_map(&self, case: KeyCase) -> CredentialMap {
        self.values
            .iter()
            .map(|(field, value)| (field.key(case).to_string(), value.clone()))
            .collect()
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(redact_map(&self.to_map(KeyCase::Snake)))
            .finish()
    }
}

/// Credential resolved for one registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredential {
    /// Registry URL.
    pub url: String,
    /// User name.
    pub user: String,
    /// Password or token.
    pub pass: SecretString,
    /// Registry is the primary image source.
    pub keos_registry: bool,
}

impl RegistryCredential {
    /// Render as `url`/`user`/`pass` with the keos flag.
    #[must_use]
    pub fn to_map(&self, case: KeyCase) -> CredentialMap {
        let mut map = self.auth_map(case);
        map.insert(KEOS_REGISTRY_KEY.to_string(), self.keos_registry.to_string());
        map
    }

    /// Render only the auth triple.
    #[must_use]
    pub fn auth_map(&self, case: KeyCase) -> CredentialMap {
        BTreeMap::from([
            (CredentialField::Url.key(case).to_string(), self.url.clone()),
            (CredentialField::User.key(case).to_string(), self.user.clone()),
            (
                CredentialField::Pass.key(case).to_string(),
                self.pass.expose().to_string(),
            ),
        ])
    }
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegistryCredential")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("pass", &self.pass)
            .field("keos_registry", &self.keos_registry)
            .finish()
    }
}

/// Everything downstream provisioning needs to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCredentials {
    /// Provider the credentials belong to.
    pub provider: InfraProvider,
    /// Provider credential block.
    pub provider_credentials: ProviderCredentials,
    /// Credential of the primary registry, when it requires auth.
    pub keos_registry: Option<RegistryCredential>,
    /// Credentials of every auth-required registry.
    pub docker_registries: Vec<RegistryCredential>,
    /// GitHub token, empty when never set.
    pub github_token: SecretString,
}

/// Plain-map rendering of [`ClusterCredentials`].
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenedCredentials {
    /// Provider credentials.
    pub provider: CredentialMap,
    /// Primary registry `url`/`user`/`pass`, empty when not required.
    pub keos_registry: CredentialMap,
    /// Per-registry maps including the `keos_registry` flag.
    pub docker_registries: Vec<CredentialMap>,
    /// GitHub token, empty when never set.
    pub github_token: String,
}

impl fmt::Debug for FlattenedCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registries: Vec<_> = self.docker_registries.iter().map(redact_map).collect();
        formatter
            .debug_struct("FlattenedCredentials")
            .field("provider", &redact_map(&self.provider))
            .field("keos_registry", &redact_map(&self.keos_registry))
            .field("docker_registries", &registries)
            .field("github_token", &SecretString::from(self.github_token.as_str()))
            .finish()
    }
}

const GCP_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GCP_TOKEN_URI: &str = "https://accounts.google.com/o/oauth2/token";
const GCP_AUTH_PROVIDER_CERT_URL: &str = "https://www.googleapis.com/oauth2/v1/certs";
const GCP_CLIENT_CERT_URL_PREFIX: &str = "https://www.googleapis.com/robot/v1/metadata/x509/";

impl ClusterCredentials {
    /// Flatten every credential into string maps using `case`.
    #[must_use]
    pub fn flatten(&self, case: KeyCase) -> FlattenedCredentials {
        FlattenedCredentials {
            provider: self.provider_credentials.to_map(case),
            keos_registry: self
                .keos_registry
                .as_ref()
                .map(|registry| registry.auth_map(case))
                .unwrap_or_default(),
            docker_registries: self
                .docker_registries
                .iter()
                .map(|registry| registry.to_map(case))
                .collect(),
            github_token: self.github_token.expose().to_string(),
        }
    }

    /// Service-account key document for GCP credentials.
    ///
    /// Returns `None` for other providers.
    #[must_use]
    pub fn gcp_service_account_json(&self) -> Option<serde_json::Value> {
        if self.provider != InfraProvider::Gcp {
            return None;
        }
        let get = |field| self.provider_credentials.get(field).unwrap_or_default();
        let client_email = get(CredentialField::ClientEmail);
        Some(serde_json::json!({
            "type": "service_account",
            "project_id": get(CredentialField::ProjectId),
            "private_key_id": get(CredentialField::PrivateKeyId),
            "private_key": get(CredentialField::PrivateKey),
            "client_email": client_email,
            "client_id": get(CredentialField::ClientId),
            "auth_uri": GCP_AUTH_URI,
            "token_uri": GCP_TOKEN_URI,
            "auth_provider_x509_cert_url": GCP_AUTH_PROVIDER_CERT_URL,
            "client_x509_cert_url": format!("{GCP_CLIENT_CERT_URL_PREFIX}{client_email}"),
        }))
    }
}
