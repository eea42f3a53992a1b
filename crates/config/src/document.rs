//! Descriptor and secrets document parsing.
//!
//! Descriptors are usually `KeosCluster` manifests; a bare `{ name, spec }`
//! document is accepted too. Secrets documents hold clear text under a
//! top-level `secrets` key.

use keos_domain::{ClusterDescriptor, ClusterSpec, Secrets};
use keos_shared::{ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;

/// Manifest kind accepted for descriptors.
pub const KEOS_CLUSTER_KIND: &str = "KeosCluster";

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl DocumentFormat {
    /// Format implied by a file extension; extension-less paths are YAML.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(DocumentError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default, rename = "apiVersion")]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default)]
    name: Option<String>,
    spec: ClusterSpec,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSecrets {
    #[serde(default)]
    secrets: Secrets,
}

/// Parse a cluster descriptor.
pub fn parse_descriptor(
    input: &str,
    format: DocumentFormat,
) -> Result<ClusterDescriptor, DocumentError> {
    let raw: RawDescriptor = deserialize(input, format, "descriptor")?;

    if let Some(kind) = raw.kind.as_deref()
        && kind != KEOS_CLUSTER_KIND
    {
        return Err(DocumentError::UnsupportedKind {
            found: kind.to_string(),
        });
    }
    if let Some(api_version) = raw.api_version.as_deref() {
        tracing::debug!(api_version, "parsed KeosCluster manifest");
    }

    let name = raw
        .metadata
        .and_then(|metadata| metadata.name)
        .or(raw.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(DocumentError::MissingName)?;

    Ok(ClusterDescriptor::new(name, raw.spec))
}

/// Parse a clear-text secrets document.
pub fn parse_secrets(input: &str, format: DocumentFormat) -> Result<Secrets, DocumentError> {
    if input.trim().is_empty() {
        return Ok(Secrets::default());
    }
    let raw: RawSecrets = deserialize(input, format, "secrets")?;
    Ok(raw.secrets)
}

fn deserialize<T: DeserializeOwned>(
    input: &str,
    format: DocumentFormat,
    document: &'static str,
) -> Result<T, DocumentError> {
    let result = match format {
        DocumentFormat::Yaml => serde_yaml_ng::from_str(input).map_err(|error| error.to_string()),
        DocumentFormat::Json => serde_json::from_str(input).map_err(|error| error.to_string()),
    };
    result.map_err(|reason| DocumentError::Malformed {
        document,
        format,
        reason,
    })
}

/// Typed document errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The document does not deserialize into the schema.
    Malformed {
        /// `descriptor` or `secrets`.
        document: &'static str,
        /// Format the input was parsed as.
        format: DocumentFormat,
        /// Parser message.
        reason: String,
    },
    /// The manifest `kind` is not `KeosCluster`.
    UnsupportedKind {
        /// Kind found in the manifest.
        found: String,
    },
    /// Neither `metadata.name` nor `name` carries a cluster name.
    MissingName,
    /// The file extension maps to no known format.
    UnsupportedFormat {
        /// Lowercased extension.
        extension: String,
    },
}

impl DocumentError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Malformed {
                format: DocumentFormat::Yaml,
                ..
            } => ErrorCode::new("config", "invalid_yaml"),
            Self::Malformed {
                format: DocumentFormat::Json,
                ..
            } => ErrorCode::new("config", "invalid_json"),
            Self::UnsupportedKind { .. } => ErrorCode::new("config", "unsupported_kind"),
            Self::MissingName => ErrorCode::new("config", "missing_cluster_name"),
            Self::UnsupportedFormat { .. } => ErrorCode::new("config", "unsupported_format"),
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed {
                document,
                format,
                reason,
            } => write!(formatter, "invalid {document} {}: {reason}", format.as_str()),
            Self::UnsupportedKind { found } => {
                write!(
                    formatter,
                    "unsupported document kind `{found}`; expected {KEOS_CLUSTER_KIND}"
                )
            },
            Self::MissingName => formatter.write_str("descriptor metadata.name must be set"),
            Self::UnsupportedFormat { .. } => {
                formatter.write_str("unsupported document format; use .yaml, .yml or .json")
            },
        }
    }
}

impl std::error::Error for DocumentError {}

impl From<DocumentError> for ErrorEnvelope {
    fn from(error: DocumentError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            DocumentError::Malformed { document, .. } => envelope.with_metadata("source", document),
            DocumentError::UnsupportedKind { found } => envelope.with_metadata("kind", found),
            DocumentError::MissingName => envelope.with_metadata("field", "metadata.name"),
            DocumentError::UnsupportedFormat { extension } => {
                envelope.with_metadata("extension", extension)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keos_domain::InfraProvider;
    use std::error::Error;

    #[test]
    fn bare_descriptors_are_accepted() -> Result<(), Box<dyn Error>> {
        let descriptor = parse_descriptor(
            r#"{"name":"demo","spec":{"infra_provider":"gcp","region":"europe-west4"}}"#,
            DocumentFormat::Json,
        )?;
        assert_eq!(descriptor.name, "demo");
        assert_eq!(descriptor.spec.infra_provider, InfraProvider::Gcp);
        assert!(descriptor.spec.control_plane.highly_available);
        Ok(())
    }

    #[test]
    fn foreign_kinds_are_rejected() {
        let input = "kind: Cluster\nmetadata:\n  name: demo\nspec:\n  infra_provider: aws\n";
        assert_eq!(
            parse_descriptor(input, DocumentFormat::Yaml).err(),
            Some(DocumentError::UnsupportedKind {
                found: "Cluster".to_string()
            })
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        let input = "kind: KeosCluster\nmetadata:\n  name: '  '\nspec:\n  infra_provider: aws\n";
        assert_eq!(
            parse_descriptor(input, DocumentFormat::Yaml).err(),
            Some(DocumentError::MissingName)
        );
    }

    #[test]
    fn unknown_providers_map_to_yaml_errors() -> Result<(), Box<dyn Error>> {
        let input = "kind: KeosCluster\nmetadata:\n  name: demo\nspec:\n  infra_provider: openstack\n";
        let error: ErrorEnvelope = parse_descriptor(input, DocumentFormat::Yaml)
            .err()
            .ok_or_else(|| std::io::Error::other("expected parse error"))?
            .into();
        assert_eq!(error.code, ErrorCode::new("config", "invalid_yaml"));
        assert_eq!(
            error.metadata.get("source").map(String::as_str),
            Some("descriptor")
        );
        Ok(())
    }

    #[test]
    fn empty_secrets_documents_are_empty() -> Result<(), Box<dyn Error>> {
        assert_eq!(parse_secrets("", DocumentFormat::Yaml)?, Secrets::default());
        assert_eq!(parse_secrets("{}", DocumentFormat::Json)?, Secrets::default());
        Ok(())
    }

    #[test]
    fn formats_follow_extensions() -> Result<(), Box<dyn Error>> {
        assert_eq!(
            DocumentFormat::from_path(Path::new("cluster.YML"))?,
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("secrets.json"))?,
            DocumentFormat::Json
        );
        assert!(DocumentFormat::from_path(Path::new("cluster.toml")).is_err());
        Ok(())
    }
}
