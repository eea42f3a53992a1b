//! Credential resolution.
//!
//! Provider blocks come from the secrets document when it carries a usable
//! block for the active provider, otherwise from the descriptor. Registry
//! logins are looked up per registry, secrets first.

use crate::error::ValidationError;
use crate::patterns::GITHUB_TOKEN;
use crate::rules::{RuleExt, RuleViolation, matches};
use keos_domain::{
    ClusterCredentials, ClusterSpec, CredentialBlock, DockerRegistry, DockerRegistryCredentials,
    InfraProvider, ProviderCredentials, RegistryCredential, Secrets, non_empty,
};
use keos_shared::SecretString;

/// Resolve every credential the cluster needs.
pub fn resolve_credentials(
    spec: &ClusterSpec,
    secrets: Option<&Secrets>,
) -> Result<ClusterCredentials, ValidationError> {
    let provider_credentials = resolve_provider_credentials(spec, secrets)?;
    complete_credentials(spec, secrets, provider_credentials)
}

/// Resolve the block of the active provider.
pub fn resolve_provider_credentials(
    spec: &ClusterSpec,
    secrets: Option<&Secrets>,
) -> Result<ProviderCredentials, ValidationError> {
    let inline = &spec.credentials;
    match spec.infra_provider {
        InfraProvider::Aws => pick_block(
            secrets.and_then(|s| s.aws.as_ref()).map(|s| &s.credentials),
            inline.aws.as_ref(),
        ),
        InfraProvider::Gcp => pick_block(
            secrets.and_then(|s| s.gcp.as_ref()).map(|s| &s.credentials),
            inline.gcp.as_ref(),
        ),
        InfraProvider::Azure => pick_block(
            secrets.and_then(|s| s.azure.as_ref()).map(|s| &s.credentials),
            inline.azure.as_ref(),
        ),
    }
}

fn pick_block<B: CredentialBlock>(
    secret: Option<&B>,
    inline: Option<&B>,
) -> Result<ProviderCredentials, ValidationError> {
    let block = secret
        .filter(|block| !block.is_zero())
        .or_else(|| inline.filter(|block| !block.is_zero()))
        .ok_or_else(|| {
            ValidationError::missing_credentials(format!(
                "no credentials for provider {} in the secrets document or the descriptor",
                B::PROVIDER
            ))
        })?;
    if let Some(field) = block.first_missing() {
        return Err(ValidationError::missing_credentials(format!(
            "{} credentials: {field} is not set",
            B::PROVIDER
        )));
    }
    Ok(block.to_provider_credentials())
}

/// Resolve registry logins and the token on top of provider credentials.
pub fn complete_credentials(
    spec: &ClusterSpec,
    secrets: Option<&Secrets>,
    provider_credentials: ProviderCredentials,
) -> Result<ClusterCredentials, ValidationError> {
    let mut docker_registries = Vec::new();
    let mut keos_registry = None;

    for registry in spec.docker_registries.iter().filter(|registry| registry.auth_required) {
        let login = registry_credential(spec, secrets, registry)?;
        let resolved = to_registry_credential(login, registry.keos_registry);
        if registry.keos_registry {
            keos_registry = Some(resolved.clone());
        }
        docker_registries.push(resolved);
    }

    if keos_registry.is_none() {
        let external = secrets.and_then(|secrets| secrets.external_registry.as_ref());
        if let (Some(primary), Some(external)) = (spec.keos_registry(), external)
            && external.url == primary.url
        {
            keos_registry = Some(to_registry_credential(external, true));
        }
    }

    Ok(ClusterCredentials {
        provider: spec.infra_provider,
        provider_credentials,
        keos_registry,
        docker_registries,
        github_token: resolve_github_token(spec, secrets)?,
    })
}

fn to_registry_credential(login: &DockerRegistryCredentials, keos_registry: bool) -> RegistryCredential {
    RegistryCredential {
        url: login.url.clone(),
        user: login.user.clone(),
        pass: SecretString::new(login.pass.as_str()),
        keos_registry,
    }
}

/// Login for `registry`, searching the secrets document before the descriptor.
pub fn registry_credential<'a>(
    spec: &'a ClusterSpec,
    secrets: Option<&'a Secrets>,
    registry: &DockerRegistry,
) -> Result<&'a DockerRegistryCredentials, ValidationError> {
    let mut sources: Vec<Vec<&'a DockerRegistryCredentials>> = Vec::with_capacity(2);
    if let Some(secrets) = secrets {
        let mut listed: Vec<_> = secrets.docker_registries.iter().collect();
        if registry.keos_registry {
            listed.extend(secrets.external_registry.iter());
        }
        sources.push(listed);
    }
    sources.push(spec.credentials.docker_registries.iter().collect());

    for source in sources {
        let found: Vec<&DockerRegistryCredentials> = source
            .into_iter()
            .filter(|login| login.url == registry.url)
            .collect();
        match found.as_slice() {
            [] => {},
            [login] => return Ok(*login),
            _ => {
                return Err(ValidationError::invariant(
                    "credentials.docker_registries",
                    format!("there is more than one credential for the registry: {}", registry.url),
                ));
            },
        }
    }

    Err(ValidationError::missing_credentials(format!(
        "there aren't valid credentials for the registry: {}",
        registry.url
    )))
}

fn resolve_github_token(
    spec: &ClusterSpec,
    secrets: Option<&Secrets>,
) -> Result<SecretString, ValidationError> {
    let token = secrets
        .and_then(|secrets| non_empty(secrets.github_token.as_ref()))
        .or_else(|| non_empty(spec.credentials.github_token.as_ref()));
    let Some(token) = token else {
        return Ok(SecretString::default());
    };
    // The reason from `matches` would echo the token.
    matches(token, &GITHUB_TOKEN)
        .map_err(|_| RuleViolation::new("github_token is not valid"))
        .or_invalid("credentials", "github_token")?;
    Ok(SecretString::new(token))
}
