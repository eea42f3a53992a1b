//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for results carrying an [`ErrorEnvelope`].
pub trait ResultExt<T> {
    /// Prefix the error message with a context label.
    fn context(self, context: &str) -> Result<T>;

    /// Attach a metadata entry to the error, if any.
    fn with_metadata(self, key: &str, value: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|error| error.with_context(context))
    }

    fn with_metadata(self, key: &str, value: &str) -> Result<T> {
        self.map_err(|error| error.with_metadata(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorCode, ErrorEnvelope};

    #[test]
    fn context_is_applied_to_errors_only() {
        let ok: Result<i32> = Ok(1);
        assert!(matches!(ok.context("aws"), Ok(1)));

        let failed: Result<i32> =
            Err(ErrorEnvelope::expected(ErrorCode::validation("invalid_value"), "bad input"));
        let error = failed.context("gcp").err();
        assert_eq!(error.map(|error| error.message), Some("gcp: bad input".to_string()));
    }

    #[test]
    fn metadata_is_attached() {
        let failed: Result<()> = Err(ErrorEnvelope::expected(ErrorCode::validation("invalid_value"), "bad"));
        let error = failed.with_metadata("field", "region").err();
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("field"))
                .map(String::as_str),
            Some("region")
        );
    }
}
