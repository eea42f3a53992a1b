//! Infrastructure provider identifiers and the validator selection key.

use keos_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cloud provider hosting the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfraProvider {
    /// Amazon Web Services.
    Aws,
    /// Google Cloud Platform.
    Gcp,
    /// Microsoft Azure.
    Azure,
}

impl InfraProvider {
    /// All supported providers, in a stable order.
    pub const ALL: [Self; 3] = [Self::Aws, Self::Gcp, Self::Azure];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
        }
    }

    /// Parse a provider identifier (case-insensitive, trimmed).
    pub fn parse(input: &str) -> Result<Self, ProviderError> {
        let normalized = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == normalized)
            .ok_or_else(|| ProviderError::UnknownProvider {
                input: input.to_string(),
            })
    }
}

impl fmt::Display for InfraProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Who runs the Kubernetes control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPlaneMode {
    /// Hosted by the provider (EKS, GKE, AKS).
    Managed,
    /// Self-managed control-plane machines.
    Unmanaged,
}

impl ControlPlaneMode {
    /// Map the descriptor's `managed` flag to a mode.
    #[must_use]
    pub const fn from_managed(managed: bool) -> Self {
        if managed { Self::Managed } else { Self::Unmanaged }
    }

    /// Returns true for provider-hosted control planes.
    #[must_use]
    pub const fn is_managed(self) -> bool {
        matches!(self, Self::Managed)
    }
}

/// Closed set of rule sets, one per (provider, control-plane mode) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidatorKind {
    /// Amazon EKS.
    AwsManaged,
    /// Self-managed cluster on AWS.
    AwsUnmanaged,
    /// Google GKE.
    GcpManaged,
    /// Self-managed cluster on GCP.
    GcpUnmanaged,
    /// Azure AKS.
    AzureManaged,
    /// Self-managed cluster on Azure.
    AzureUnmanaged,
}

impl ValidatorKind {
    /// Every validator kind.
    pub const ALL: [Self; 6] = [
        Self::AwsManaged,
        Self::AwsUnmanaged,
        Self::GcpManaged,
        Self::GcpUnmanaged,
        Self::AzureManaged,
        Self::AzureUnmanaged,
    ];

    /// Select the kind for a provider and control-plane mode.
    #[must_use]
    pub const fn select(provider: InfraProvider, mode: ControlPlaneMode) -> Self {
        match (provider, mode) {
            (InfraProvider::Aws, ControlPlaneMode::Managed) => Self::AwsManaged,
            (InfraProvider::Aws, ControlPlaneMode::Unmanaged) => Self::AwsUnmanaged,
            (InfraProvider::Gcp, ControlPlaneMode::Managed) => Self::GcpManaged,
            (InfraProvider::Gcp, ControlPlaneMode::Unmanaged) => Self::GcpUnmanaged,
            (InfraProvider::Azure, ControlPlaneMode::Managed) => Self::AzureManaged,
            (InfraProvider::Azure, ControlPlaneMode::Unmanaged) => Self::AzureUnmanaged,
        }
    }

    /// Provider half of the key.
    #[must_use]
    pub const fn provider(self) -> InfraProvider {
        match self {
            Self::AwsManaged | Self::AwsUnmanaged => InfraProvider::Aws,
            Self::GcpManaged | Self::GcpUnmanaged => InfraProvider::Gcp,
            Self::AzureManaged | Self::AzureUnmanaged => InfraProvider::Azure,
        }
    }

    /// Control-plane half of the key.
    #[must_use]
    pub const fn mode(self) -> ControlPlaneMode {
        match self {
            Self::AwsManaged | Self::GcpManaged | Self::AzureManaged => ControlPlaneMode::Managed,
            Self::AwsUnmanaged | Self::GcpUnmanaged | Self::AzureUnmanaged => {
                ControlPlaneMode::Unmanaged
            },
        }
    }

    /// Returns true for managed-service kinds.
    #[must_use]
    pub const fn is_managed(self) -> bool {
        self.mode().is_managed()
    }

    /// Name of the managed Kubernetes service, if any.
    #[must_use]
    pub const fn managed_service(self) -> Option<&'static str> {
        match self {
            Self::AwsManaged => Some("EKS"),
            Self::GcpManaged => Some("GKE"),
            Self::AzureManaged => Some("AKS"),
            Self::AwsUnmanaged | Self::GcpUnmanaged | Self::AzureUnmanaged => None,
        }
    }

    /// Stable identifier used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwsManaged => "aws-managed",
            Self::AwsUnmanaged => "aws-unmanaged",
            Self::GcpManaged => "gcp-managed",
            Self::GcpUnmanaged => "gcp-unmanaged",
            Self::AzureManaged => "azure-managed",
            Self::AzureUnmanaged => "azure-unmanaged",
        }
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Failures parsing provider identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Identifier is not one of `aws`, `gcp`, `azure`.
    UnknownProvider {
        /// Raw input.
        input: String,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProvider { input } => write!(
                formatter,
                "infra_provider `{input}` is not supported, supported providers: aws, gcp, azure"
            ),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for ErrorEnvelope {
    fn from(error: ProviderError) -> Self {
        let message = error.to_string();
        match error {
            ProviderError::UnknownProvider { input } => {
                Self::expected(ErrorCode::new("domain", "unknown_provider"), message)
                    .with_metadata("input", input)
            },
        }
    }
}
