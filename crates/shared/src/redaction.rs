//! Secret detection and redaction utilities.
//!
//! Provides consistent logic for detecting sensitive keys and redacting their
//! values in error metadata, logs and `Debug` output of credential maps.

use std::collections::BTreeMap;

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key name likely refers to a secret.
///
/// Matching is case-insensitive and works for both `snake_case` and
/// `CamelCase` credential field names.
///
/// # Examples
///
/// ```
/// use keos_shared::is_secret_key;
///
/// assert!(is_secret_key("secret_key"));
/// assert!(is_secret_key("ClientSecret"));
/// assert!(is_secret_key("pass"));
/// assert!(is_secret_key("github_token"));
/// assert!(!is_secret_key("region"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASS")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
///
/// # Examples
///
/// ```
/// use keos_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("SecretKey", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_secret("region", "eu-west-1"), "eu-west-1");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// Returns a copy of a string map with secret-looking values redacted.
#[must_use]
pub fn redact_map(map: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(key, value)| (key.clone(), redact_if_secret(key, value)))
        .collect()
}

/// A secret string wrapper that redacts on Display/Debug.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when no secret is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}
