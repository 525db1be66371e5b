use std::thread;
use std::time::Duration;

use crate::domain::{DiagramSource, GenerationError, GenerationRequest, ProviderKind};
use crate::infra::credentials::CredentialStore;
use crate::infra::llm::env::{
    ENV_OFFLINE_DELAY_MS, ENV_TIMEOUT_SECS, read_delay_from_env, read_timeout_from_env,
    resolve_with_env_fallback,
};
use crate::infra::llm::{DEFAULT_TIMEOUT, HttpTransport, ProviderRegistry, sanitize_diagram_source};

use super::placeholder::placeholder_diagram;

pub const DEFAULT_OFFLINE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub timeout: Duration,
    /// Artificial wait before a placeholder diagram is returned.
    pub offline_delay: Duration,
    /// When false, a missing credential is an error instead of a placeholder.
    pub offline_fallback: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            offline_delay: DEFAULT_OFFLINE_DELAY,
            offline_fallback: true,
        }
    }
}

impl GenerationSettings {
    pub fn from_env(timeout_override: Option<Duration>) -> Result<Self, GenerationError> {
        let timeout = resolve_with_env_fallback(
            timeout_override,
            || read_timeout_from_env(ENV_TIMEOUT_SECS),
            DEFAULT_TIMEOUT,
        )?;
        let offline_delay =
            read_delay_from_env(ENV_OFFLINE_DELAY_MS)?.unwrap_or(DEFAULT_OFFLINE_DELAY);

        Ok(Self {
            timeout,
            offline_delay,
            offline_fallback: true,
        })
    }
}

/// Turns a free-text prompt into validated Mermaid source.
///
/// Each call is independent: no retries, no queue, nothing shared between
/// calls except the immutable provider wiring and the HTTP client.
#[derive(Clone)]
pub struct DiagramGenerationService {
    registry: ProviderRegistry,
    transport: HttpTransport,
    settings: GenerationSettings,
}

impl DiagramGenerationService {
    pub fn with_settings(
        registry: ProviderRegistry,
        settings: GenerationSettings,
    ) -> Result<Self, GenerationError> {
        let transport = HttpTransport::with_timeout(settings.timeout)?;
        Ok(Self {
            registry,
            transport,
            settings,
        })
    }

    pub fn generate(
        &self,
        prompt: &str,
        provider: ProviderKind,
        credential: Option<&str>,
    ) -> Result<DiagramSource, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let credential = credential.map(str::trim).filter(|value| !value.is_empty());
        let Some(credential) = credential else {
            if !self.settings.offline_fallback {
                return Err(GenerationError::MissingCredential { provider });
            }
            tracing::info!(provider = %provider, "no API key configured, using offline placeholder");
            if !self.settings.offline_delay.is_zero() {
                thread::sleep(self.settings.offline_delay);
            }
            return Ok(placeholder_diagram(prompt));
        };

        self.generate_remote(&GenerationRequest::new(prompt, provider, credential))
    }

    /// Reads the selected provider (default OpenAI) and its key from `store`.
    pub fn generate_for_selection(
        &self,
        prompt: &str,
        store: &dyn CredentialStore,
    ) -> Result<DiagramSource, GenerationError> {
        let provider = store
            .selected_provider()
            .map_err(|err| GenerationError::internal(err.to_string()))?
            .unwrap_or_default();
        let credential = store
            .get(provider)
            .map_err(|err| GenerationError::internal(err.to_string()))?;

        self.generate(prompt, provider, credential.as_deref())
    }

    fn generate_remote(
        &self,
        request: &GenerationRequest,
    ) -> Result<DiagramSource, GenerationError> {
        request.validate()?;

        let adapter = self.registry.resolve(request.provider)?;
        let outbound = adapter.build_request(&request.prompt, &request.credential)?;
        let response_body = self.transport.send(request.provider, &outbound)?;
        let text = adapter.extract_text(&response_body)?;

        DiagramSource::validate(sanitize_diagram_source(&text)).inspect_err(|_| {
            tracing::warn!(
                provider = %request.provider,
                preview = %text.chars().take(60).collect::<String>(),
                "model output did not start with a Mermaid diagram keyword"
            );
        })
    }
}
