//! # keos-shared
//!
//! Shared result types, error envelope and redaction helpers for the
//! keos-validate workspace.
//!
//! This crate provides foundational types that are used across all other crates:
//!
//! - Result and error envelope types
//! - Secret redaction for logs and credential maps
//! - The `Validated<T>` proof marker
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Error envelopes serialize for structured logs

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod invariants;
pub mod redaction;
pub mod result;

pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use invariants::Validated;
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret, redact_map};
pub use result::{Result, ResultExt};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind};
    use super::result::{Result, ResultExt};

    #[test]
    fn shared_error_types_are_available() {
        let error = ErrorEnvelope::expected(ErrorCode::validation("required_value"), "region is required");
        assert_eq!(error.kind, ErrorKind::Expected);
        assert_eq!(error.class, ErrorClass::NonRetriable);
    }

    #[test]
    fn envelope_serializes_without_empty_metadata() -> std::result::Result<(), serde_json::Error> {
        let error = ErrorEnvelope::expected(ErrorCode::validation("invalid_value"), "bad");
        let encoded = serde_json::to_value(&error)?;
        assert!(encoded.get("metadata").is_none());
        assert_eq!(encoded.get("kind"), Some(&serde_json::Value::from("Expected")));
        Ok(())
    }

    #[test]
    fn shared_result_type_is_available() {
        let value: Result<i32> = Ok(5);
        assert!(matches!(value.context("unused"), Ok(5)));
    }
}
