//! Error fixtures for metadata collaborator failures.

use keos_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Codes a metadata collaborator commonly reports.
pub fn metadata_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::metadata("throttled"),
        ErrorCode::metadata("permission_denied"),
        ErrorCode::metadata("timeout"),
        ErrorCode::metadata("unavailable"),
    ]
}

/// Retriable throttling error.
pub fn throttled_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::metadata("throttled"),
        "rate exceeded",
        ErrorClass::Retriable,
    )
}

/// Credentials lacking permissions.
pub fn permission_denied_error() -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::metadata("permission_denied"), "access denied")
}

/// Retriable network timeout.
pub fn timeout_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(ErrorCode::metadata("timeout"), "request timed out", ErrorClass::Retriable)
}
