//! Format patterns used by the rule sets.

use crate::rules::Pattern;

/// `v1.26.8`, optionally with a GKE build suffix.
pub static K8S_VERSION: Pattern = Pattern::new(r"^v\d.\d{2}.\d{1,2}(-gke.\d{3,4})?$");
/// Worker node group names.
pub static WORKER_NAME: Pattern = Pattern::new(r"^[-a-z]([-a-z0-9]*[a-z0-9])+$");
/// `key=value:Effect` taints.
pub static TAINT: Pattern =
    Pattern::new(r"^(\w+|.*)=(\w+|.*):(NoSchedule|PreferNoSchedule|NoExecute)$");
/// `key1=value1,key2=value2` label lists.
pub static LABELS: Pattern = Pattern::new(r"^(\w+=\w+),?(\s*\w+=\w+)*$");
/// GitHub personal access tokens.
pub static GITHUB_TOKEN: Pattern = Pattern::new(r"^(github_pat_|ghp_)\w+$");

/// AMI identifiers.
pub static AWS_NODE_IMAGE: Pattern = Pattern::new(r"^ami-\w+$");
/// KMS key ARNs.
pub static AWS_KMS_KEY: Pattern = Pattern::new(r"^arn:aws:kms:[a-zA-Z0-9-]+:\d{12}:key/[\w-]+$");

/// Compute Engine images.
pub static GCP_NODE_IMAGE: Pattern = Pattern::new(r"^projects/[\w-]+/global/images/[\w-]+$");
/// Cloud KMS crypto keys.
pub static GCP_KMS_KEY: Pattern = Pattern::new(
    r"^projects/[a-zA-Z0-9-]+/locations/[a-zA-Z0-9-]+/keyRings/[a-zA-Z0-9-]+/cryptoKeys/[a-zA-Z0-9-]+$",
);
/// GKE versions always carry the build suffix.
pub static GKE_VERSION: Pattern = Pattern::new(r"^v\d.\d{2}.\d{1,2}-gke.\d{3,4}$");

/// User-assigned managed identities.
pub static AZURE_IDENTITY: Pattern = Pattern::new(
    r"(?i)^/subscriptions/[\w-]+/resourcegroups/[\w\.-]+/providers/Microsoft\.ManagedIdentity/userAssignedIdentities/[\w\.-]+$",
);
/// Managed images.
pub static AZURE_NODE_IMAGE: Pattern = Pattern::new(
    r"(?i)^/subscriptions/[\w-]+/resourceGroups/[\w\.-]+/providers/Microsoft\.Compute/images/[\w\.-]+$",
);
/// Disk encryption sets.
pub static AZURE_DISK_ENCRYPTION_SET: Pattern = Pattern::new(
    r"(?i)^/subscriptions/[\w-]+/resourceGroups/[\w\.-]+/providers/Microsoft\.Compute/diskEncryptionSets/[\w\.-]+$",
);
/// Premium disk SKUs.
pub static AZURE_PREMIUM_VOLUME: Pattern = Pattern::new(r"^(Premium|Ultra).*$");
/// AKS node pool names.
pub static AKS_NODE_NAME: Pattern = Pattern::new(r"^[a-z0-9]+$");

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[&Pattern] = &[
        &K8S_VERSION,
        &WORKER_NAME,
        &TAINT,
        &LABELS,
        &GITHUB_TOKEN,
        &AWS_NODE_IMAGE,
        &AWS_KMS_KEY,
        &GCP_NODE_IMAGE,
        &GCP_KMS_KEY,
        &GKE_VERSION,
        &AZURE_IDENTITY,
        &AZURE_NODE_IMAGE,
        &AZURE_DISK_ENCRYPTION_SET,
        &AZURE_PREMIUM_VOLUME,
        &AKS_NODE_NAME,
    ];

    #[test]
    fn every_pattern_compiles() {
        for pattern in ALL {
            assert_eq!(pattern.compile_error(), None, "{}", pattern.source());
        }
    }

    #[test]
    fn versions() {
        assert!(K8S_VERSION.is_match("v1.26.8"));
        assert!(K8S_VERSION.is_match("v1.27.3-gke.1700"));
        assert!(!K8S_VERSION.is_match("1.26.8"));
        assert!(GKE_VERSION.is_match("v1.27.3-gke.1700"));
        assert!(!GKE_VERSION.is_match("v1.27.3"));
    }

    #[test]
    fn labels_and_taints() {
        assert!(LABELS.is_match("team=core"));
        assert!(LABELS.is_match("team=core,env=prod"));
        assert!(!LABELS.is_match("team"));
        assert!(TAINT.is_match("dedicated=gpu:NoSchedule"));
        assert!(!TAINT.is_match("dedicated=gpu:Sometimes"));
    }

    #[test]
    fn provider_resource_ids() {
        assert!(AWS_NODE_IMAGE.is_match("ami-0a1b2c3d4e"));
        assert!(AWS_KMS_KEY.is_match(
            "arn:aws:kms:eu-west-1:123456789012:key/1234abcd-12ab-34cd-56ef-1234567890ab"
        ));
        assert!(GCP_NODE_IMAGE.is_match("projects/demo/global/images/keos-node-1-26"));
        assert!(AZURE_NODE_IMAGE.is_match(
            "/subscriptions/0000/resourceGroups/images-rg/providers/Microsoft.Compute/images/keos-1.26"
        ));
        assert!(AZURE_IDENTITY.is_match(
            "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/cp"
        ));
        assert!(GITHUB_TOKEN.is_match("ghp_abc123"));
        assert!(!GITHUB_TOKEN.is_match("gho_abc123"));
    }
}
