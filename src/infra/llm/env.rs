use std::time::Duration;

use crate::domain::{GenerationError, ProviderKind};

pub(crate) const ENV_TIMEOUT_SECS: &str = "MAPI_LLM_TIMEOUT_SECS";
pub(crate) const ENV_OFFLINE_DELAY_MS: &str = "MAPI_OFFLINE_DELAY_MS";

pub(crate) fn read_env_var(name: &str) -> Result<Option<String>, GenerationError> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(GenerationError::configuration(format!(
            "{name} could not be read: {error}"
        ))),
    }
}

pub(crate) fn parse_timeout_seconds(name: &str, value: &str) -> Result<Duration, GenerationError> {
    let parsed = value.trim().parse::<u64>().map_err(|_| {
        GenerationError::configuration(format!("{name} must be a positive integer in seconds"))
    })?;
    if parsed == 0 {
        return Err(GenerationError::configuration(format!(
            "{name} must be greater than 0 seconds"
        )));
    }
    Ok(Duration::from_secs(parsed))
}

pub(crate) fn parse_delay_millis(name: &str, value: &str) -> Result<Duration, GenerationError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            GenerationError::configuration(format!(
                "{name} must be a non-negative integer in milliseconds"
            ))
        })
}

pub(crate) fn read_timeout_from_env(name: &str) -> Result<Option<Duration>, GenerationError> {
    let Some(value) = read_env_var(name)? else {
        return Ok(None);
    };
    Ok(Some(parse_timeout_seconds(name, &value)?))
}

pub(crate) fn read_delay_from_env(name: &str) -> Result<Option<Duration>, GenerationError> {
    let Some(value) = read_env_var(name)? else {
        return Ok(None);
    };
    Ok(Some(parse_delay_millis(name, &value)?))
}

/// An explicit value wins; the environment is only consulted when it is absent.
pub(crate) fn resolve_with_env_fallback<F>(
    explicit: Option<Duration>,
    read_env: F,
    default: Duration,
) -> Result<Duration, GenerationError>
where
    F: FnOnce() -> Result<Option<Duration>, GenerationError>,
{
    if let Some(value) = explicit {
        return Ok(value);
    }

    Ok(read_env()?.unwrap_or(default))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EndpointOverride {
    pub base_url: Option<String>,
    pub model: Option<String>,
}

pub(crate) fn read_endpoint_override(
    provider: ProviderKind,
) -> Result<EndpointOverride, GenerationError> {
    let prefix = format!("MAPI_{}", provider.id().to_ascii_uppercase());
    Ok(EndpointOverride {
        base_url: read_env_var(&format!("{prefix}_BASE_URL"))?,
        model: read_env_var(&format!("{prefix}_MODEL"))?.map(|model| model.trim().to_string()),
    })
}
