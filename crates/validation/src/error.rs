//! Validation error taxonomy.

use keos_domain::InfraProvider;
use keos_ports::MetadataOperation;
use keos_shared::{ErrorCode, ErrorEnvelope, ErrorKind};

/// First failure found while validating a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A value has the wrong format, is out of range or is duplicated.
    #[error("{path}: Invalid value: \"{field}\": {reason}")]
    InvalidValue {
        /// Dotted path of the owning block.
        path: String,
        /// Offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A required value is missing.
    #[error("{path}: Required value: \"{field}\"")]
    RequiredValue {
        /// Dotted path of the owning block.
        path: String,
        /// Missing field.
        field: String,
    },
    /// A rule spanning several fields does not hold.
    #[error("{path}: {reason}")]
    Invariant {
        /// Dotted path of the block the rule applies to.
        path: String,
        /// Rule description.
        reason: String,
    },
    /// No usable credential could be resolved.
    #[error("{reason}")]
    MissingCredentials {
        /// What is missing.
        reason: String,
    },
    /// The cloud metadata collaborator failed.
    #[error("{provider}: {operation} failed: {}", .source.message)]
    Metadata {
        /// Provider being queried.
        provider: InfraProvider,
        /// Failed lookup.
        operation: MetadataOperation,
        /// Collaborator error.
        source: ErrorEnvelope,
    },
}

impl ValidationError {
    /// Invalid value at `path`.
    pub fn invalid(path: impl Into<String>, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: path.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Required value at `path`.
    pub fn required(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self::RequiredValue {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Cross-field rule violation at `path`.
    pub fn invariant(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invariant {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Missing credential.
    pub fn missing_credentials(reason: impl Into<String>) -> Self {
        Self::MissingCredentials {
            reason: reason.into(),
        }
    }

    /// Metadata lookup failure.
    pub const fn metadata(
        provider: InfraProvider,
        operation: MetadataOperation,
        source: ErrorEnvelope,
    ) -> Self {
        Self::Metadata {
            provider,
            operation,
            source,
        }
    }

    /// Stable error code.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidValue { .. } => ErrorCode::validation("invalid_value"),
            Self::RequiredValue { .. } => ErrorCode::validation("required_value"),
            Self::Invariant { .. } => ErrorCode::validation("invariant"),
            Self::MissingCredentials { .. } => ErrorCode::validation("missing_credentials"),
            Self::Metadata { .. } => ErrorCode::validation("metadata_lookup"),
        }
    }

    /// Path of the offending block, when the error has one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { path, .. }
            | Self::RequiredValue { path, .. }
            | Self::Invariant { path, .. } => Some(path),
            Self::MissingCredentials { .. } | Self::Metadata { .. } => None,
        }
    }
}

impl From<ValidationError> for ErrorEnvelope {
    fn from(error: ValidationError) -> Self {
        let code = error.error_code();
        let message = error.to_string();

        match error {
            ValidationError::InvalidValue { path, field, .. }
            | ValidationError::RequiredValue { path, field } => Self::expected(code, message)
                .with_metadata("path", path)
                .with_metadata("field", field),
            ValidationError::Invariant { path, .. } => {
                Self::expected(code, message).with_metadata("path", path)
            },
            ValidationError::MissingCredentials { .. } => Self::expected(code, message),
            ValidationError::Metadata {
                provider,
                operation,
                source,
            } => {
                // Keep the collaborator's own class; its metadata is merged under ours.
                let mut envelope = match source.kind {
                    ErrorKind::Unexpected | ErrorKind::Invariant => {
                        Self::unexpected(code, message, source.class)
                    },
                    ErrorKind::Expected => Self::expected(code, message),
                };
                envelope.metadata.extend(source.metadata);
                envelope
                    .with_metadata("provider", provider.as_str())
                    .with_metadata("operation", operation.as_str())
                    .with_metadata("source_code", source.code.to_string())
            },
        }
    }
}
