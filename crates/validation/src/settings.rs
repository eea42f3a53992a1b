//! Run-wide validation settings.

use std::collections::BTreeSet;

/// Kubernetes `major.minor` versions accepted when nothing else is configured.
pub const DEFAULT_SUPPORTED_K8S_VERSIONS: &[&str] = &["1.24", "1.25", "1.26", "1.27", "1.28"];

/// Settings shared by every rule set during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSettings {
    supported_k8s_versions: BTreeSet<String>,
}

impl ValidationSettings {
    /// Settings accepting the given `major.minor` versions.
    pub fn new<I, S>(supported_k8s_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported_k8s_versions: supported_k8s_versions.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `major_minor` is supported.
    #[must_use]
    pub fn supports(&self, major_minor: &str) -> bool {
        self.supported_k8s_versions.contains(major_minor)
    }

    /// Supported versions, sorted.
    pub fn supported_k8s_versions(&self) -> impl Iterator<Item = &str> {
        self.supported_k8s_versions.iter().map(String::as_str)
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORTED_K8S_VERSIONS.iter().copied())
    }
}

/// `major.minor` of a `v`-prefixed version string (`v1.26.8-gke.1` -> `1.26`).
#[must_use]
pub fn major_minor(version: &str) -> Option<String> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let major = parts.next().filter(|part| !part.is_empty())?;
    let minor = parts.next().filter(|part| !part.is_empty())?;
    Some(format!("{major}.{minor}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_current_window() {
        let settings = ValidationSettings::default();
        assert!(settings.supports("1.24"));
        assert!(settings.supports("1.28"));
        assert!(!settings.supports("1.29"));
    }

    #[test]
    fn major_minor_strips_prefix_and_patch() {
        assert_eq!(major_minor("v1.26.8").as_deref(), Some("1.26"));
        assert_eq!(major_minor("v1.27.3-gke.1700").as_deref(), Some("1.27"));
        assert_eq!(major_minor("1.28").as_deref(), Some("1.28"));
        assert_eq!(major_minor("v1"), None);
    }
}
