//! Provider-independent descriptor rules.

use crate::credentials::registry_credential;
use crate::error::ValidationError;
use crate::patterns::{K8S_VERSION, TAINT, WORKER_NAME};
use crate::rules::{RuleExt, first_duplicate, matches, one_of};
use crate::settings::{ValidationSettings, major_minor};
use keos_domain::{
    ClusterSpec, DockerRegistry, ExtraVolume, Secrets, WorkerNode, ZoneDistribution, non_empty,
};

/// Accepted predefined storage classes.
pub const STORAGE_CLASSES: &[&str] = &["standard", "premium"];

const WORKER_NAME_MIN: usize = 3;
const WORKER_NAME_MAX: usize = 25;
const BALANCED_MIN_NODES: i32 = 3;

/// Run every provider-independent rule, stopping at the first failure.
pub fn validate_common(
    spec: &ClusterSpec,
    secrets: Option<&Secrets>,
    settings: &ValidationSettings,
) -> Result<(), ValidationError> {
    validate_structure(spec)?;
    validate_k8s_version(&spec.k8s_version, settings)?;
    validate_worker_names(&spec.worker_nodes)?;
    for worker in &spec.worker_nodes {
        validate_worker_quantity(worker)?;
    }
    validate_taints(&spec.worker_nodes)?;
    validate_system_pool(&spec.worker_nodes)?;
    validate_extra_volumes(spec)?;
    validate_registries(&spec.docker_registries)?;
    for registry in spec.docker_registries.iter().filter(|registry| registry.auth_required) {
        registry_credential(spec, secrets, registry)?;
    }
    Ok(())
}

/// Shape checks that do not depend on any other block.
pub fn validate_structure(spec: &ClusterSpec) -> Result<(), ValidationError> {
    if spec.credentials.populated_providers().len() > 1 {
        return Err(ValidationError::invalid(
            "spec.credentials",
            "credentials",
            "only one provider credentials block can be set",
        ));
    }
    if spec.k8s_version.trim().is_empty() {
        return Err(ValidationError::required("spec", "k8s_version"));
    }
    if spec.region.trim().is_empty() {
        return Err(ValidationError::required("spec", "region"));
    }
    if spec.worker_nodes.is_empty() {
        return Err(ValidationError::required("spec", "worker_nodes"));
    }
    for worker in &spec.worker_nodes {
        if worker.size.trim().is_empty() {
            return Err(ValidationError::required(worker_path(worker), "size"));
        }
    }
    if let Some(class) = non_empty(spec.storage_class.class.as_ref()) {
        one_of(class, STORAGE_CLASSES, "classes").or_invalid("spec.storageclass", "class")?;
    }
    Ok(())
}

/// Version format and supported `major.minor` window.
pub fn validate_k8s_version(
    version: &str,
    settings: &ValidationSettings,
) -> Result<(), ValidationError> {
    matches(version, &K8S_VERSION).or_invalid("spec", "k8s_version")?;
    let supported = major_minor(version).is_some_and(|minor| settings.supports(&minor));
    if supported {
        return Ok(());
    }
    let window: Vec<&str> = settings.supported_k8s_versions().collect();
    Err(ValidationError::invalid(
        "spec",
        "k8s_version",
        format!("kubernetes versions supported: {}", window.join(", ")),
    ))
}

/// Name format, length and uniqueness of worker groups.
pub fn validate_worker_names(workers: &[WorkerNode]) -> Result<(), ValidationError> {
    for worker in workers {
        let name = worker.name.as_str();
        if !WORKER_NAME.is_match(name) {
            return Err(ValidationError::invalid(
                "spec.worker_nodes",
                "name",
                format!(
                    "`{name}` is invalid: must consist of lower case alphanumeric characters or '-', \
                     and must start with an alphabetic character or '-' and end with an alphanumeric \
                     character, regex used for validation is '{}'",
                    WORKER_NAME.source()
                ),
            ));
        }
        let length = name.chars().count();
        if !(WORKER_NAME_MIN..=WORKER_NAME_MAX).contains(&length) {
            return Err(ValidationError::invalid(
                "spec.worker_nodes",
                "name",
                format!(
                    "`{name}` is invalid: must be no more than {WORKER_NAME_MAX} and no less than \
                     {WORKER_NAME_MIN} characters long"
                ),
            ));
        }
    }
    if let Some((_, name)) = first_duplicate(workers, |worker| Some(worker.name.as_str())) {
        return Err(ValidationError::invalid(
            "spec.worker_nodes",
            "name",
            format!("`{name}` is duplicated"),
        ));
    }
    Ok(())
}

/// Autoscaler bounds and zone placement of one worker group.
pub fn validate_worker_quantity(worker: &WorkerNode) -> Result<(), ValidationError> {
    let path = worker_path(worker);

    if let Some(max_size) = worker.max_size
        && max_size < worker.quantity
    {
        return Err(ValidationError::invalid(
            &path,
            "max_size",
            "must be equal or greater than quantity",
        ));
    }
    if let Some(min_size) = worker.min_size {
        if worker.quantity < min_size {
            return Err(ValidationError::invalid(
                &path,
                "quantity",
                "must be equal or greater than min_size",
            ));
        }
        if min_size < 0 {
            return Err(ValidationError::invalid(&path, "min_size", "must be equal or greater than 0"));
        }
    }
    if worker.quantity < 0 {
        return Err(ValidationError::invalid(&path, "quantity", "must be equal or greater than 0"));
    }

    if non_empty(worker.az.as_ref()).is_some()
        && worker.zone_distribution == Some(ZoneDistribution::Balanced)
    {
        return Err(ValidationError::invariant(
            &path,
            "az and zone_distribution balanced cannot be set at the same time",
        ));
    }

    if worker.is_balanced() {
        let reason = format!(
            "must be equal or greater than {BALANCED_MIN_NODES} when zone_distribution is balanced"
        );
        if worker.quantity < BALANCED_MIN_NODES {
            return Err(ValidationError::invalid(&path, "quantity", reason));
        }
        if worker.min_size.is_some_and(|min_size| min_size < BALANCED_MIN_NODES) {
            return Err(ValidationError::invalid(&path, "min_size", reason));
        }
        if worker.max_size.is_some_and(|max_size| max_size < BALANCED_MIN_NODES) {
            return Err(ValidationError::invalid(&path, "max_size", reason));
        }
    }
    Ok(())
}

/// Taints use `key=value:Effect`.
pub fn validate_taints(workers: &[WorkerNode]) -> Result<(), ValidationError> {
    for worker in workers {
        for (index, taint) in worker.taints.iter().enumerate() {
            if !TAINT.is_match(taint) {
                return Err(ValidationError::invalid(
                    format!("{}.taints[{index}]", worker_path(worker)),
                    "taint",
                    format!(
                        "`{taint}` has an incorrect format, it must be key=value:Effect with \
                         Effect one of NoSchedule, PreferNoSchedule, NoExecute"
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Some group must be able to host system workloads.
pub fn validate_system_pool(workers: &[WorkerNode]) -> Result<(), ValidationError> {
    if workers.iter().any(WorkerNode::is_schedulable_system_pool) {
        Ok(())
    } else {
        Err(ValidationError::invariant(
            "spec.worker_nodes",
            "at least one worker node must be non-spot and without taints",
        ))
    }
}

/// Label and mount path uniqueness per volume owner. Control-plane volumes
/// are only checked when the control plane is unmanaged.
pub fn validate_extra_volumes(spec: &ClusterSpec) -> Result<(), ValidationError> {
    if !spec.control_plane.managed {
        unique_volume_fields("spec.control_plane", &spec.control_plane.extra_volumes)?;
    }
    for worker in &spec.worker_nodes {
        unique_volume_fields(&worker_path(worker), &worker.extra_volumes)?;
    }
    Ok(())
}

fn unique_volume_fields(owner: &str, volumes: &[ExtraVolume]) -> Result<(), ValidationError> {
    let duplicates = [
        ("label", first_duplicate(volumes, |volume| non_empty(volume.label.as_ref()))),
        (
            "mount_path",
            first_duplicate(volumes, |volume| non_empty(volume.mount_path.as_ref())),
        ),
    ];
    for (field, duplicate) in duplicates {
        if let Some((index, value)) = duplicate {
            return Err(ValidationError::invalid(
                format!("{owner}.extra_volumes[{index}]"),
                field,
                format!("`{value}` is duplicated"),
            ));
        }
    }
    Ok(())
}

/// Registry URLs are unique and exactly one registry is primary.
pub fn validate_registries(registries: &[DockerRegistry]) -> Result<(), ValidationError> {
    for (index, registry) in registries.iter().enumerate() {
        if registry.url.trim().is_empty() {
            return Err(ValidationError::required(format!("spec.docker_registries[{index}]"), "url"));
        }
    }
    if let Some((_, url)) = first_duplicate(registries, |registry| Some(registry.url.as_str())) {
        return Err(ValidationError::invariant(
            "spec.docker_registries",
            format!("there is more than one docker_registry with the same URL: {url}"),
        ));
    }
    match registries.iter().filter(|registry| registry.keos_registry).count() {
        1 => Ok(()),
        0 => Err(ValidationError::invariant(
            "spec.docker_registries",
            "there isn't any docker_registry defined as keos_registry",
        )),
        _ => Err(ValidationError::invariant(
            "spec.docker_registries",
            "there are more than one docker_registry defined as keos_registry",
        )),
    }
}

/// Path of a worker group block.
pub(crate) fn worker_path(worker: &WorkerNode) -> String {
    format!("spec.worker_nodes.{}", worker.name)
}
