//! Error envelope shared by every crate.
//!
//! Codes are namespaced: `validation` for descriptor and credential rules,
//! `metadata` for cloud inventory lookups, `config` for settings and
//! document parsing.

use crate::redaction::{REDACTED, is_secret_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Diagnostic key/value pairs carried by an envelope.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Where a failure comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The input broke a rule: descriptor, secrets, config or missing credentials.
    Expected,
    /// Inputs that contradict each other in a way no single field explains.
    Invariant,
    /// The environment failed: file reads, cloud inventory lookups.
    Unexpected,
}

impl ErrorKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Invariant => "invariant",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Retry hint for hosts. The engine never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Repeating the run may succeed (throttling, timeouts).
    Retriable,
    /// Repeating the run fails the same way.
    NonRetriable,
}

impl ErrorClass {
    /// True for [`ErrorClass::Retriable`].
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(if self.is_retriable() {
            "retriable"
        } else {
            "non-retriable"
        })
    }
}

/// `namespace:code` identifier, stable across releases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Namespace of rule violations.
    pub const VALIDATION: &'static str = "validation";
    /// Namespace of cloud inventory failures.
    pub const METADATA: &'static str = "metadata";
    /// Namespace of settings and document failures.
    pub const CONFIG: &'static str = "config";

    /// Code in an arbitrary namespace.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Code in the `validation` namespace.
    pub fn validation(code: impl Into<String>) -> Self {
        Self::new(Self::VALIDATION, code)
    }

    /// Code in the `metadata` namespace.
    pub fn metadata(code: impl Into<String>) -> Self {
        Self::new(Self::METADATA, code)
    }

    /// Code in the `config` namespace.
    pub fn config(code: impl Into<String>) -> Self {
        Self::new(Self::CONFIG, code)
    }

    /// Namespace part.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier part.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Failure as reported across crate boundaries and into logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Origin category.
    pub kind: ErrorKind,
    /// Retry hint.
    pub class: ErrorClass,
    /// Stable code.
    pub code: ErrorCode,
    /// Path-qualified, user-facing message.
    pub message: String,
    /// `path`, `field`, `provider`, `operation` and similar diagnostics.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    /// Rule violation; never retriable.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_origin(ErrorKind::Expected, ErrorClass::NonRetriable, code, message)
    }

    /// Contradictory inputs; never retriable.
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_origin(ErrorKind::Invariant, ErrorClass::NonRetriable, code, message)
    }

    /// Environment failure with the caller's retry hint.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self::with_origin(ErrorKind::Unexpected, class, code, message)
    }

    fn with_origin(
        kind: ErrorKind,
        class: ErrorClass,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            class,
            code,
            message: message.into(),
            metadata: ErrorMetadata::new(),
        }
    }

    /// Attach one metadata entry. Secret-looking keys are stored redacted.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = if is_secret_key(&key) {
            REDACTED.to_string()
        } else {
            value.into()
        };
        self.metadata.insert(key, value);
        self
    }

    /// Prefix the message, e.g. with the provider name.
    #[must_use]
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    /// True when the failure is worth retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        self.class.is_retriable()
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {} {}: {}", self.kind, self.class, self.code, self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}
