use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{GenerationError, ProviderKind};

use super::{AnthropicAdapter, GeminiAdapter, OpenAiCompatibleAdapter, ProviderAdapter};

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All four providers with their built-in endpoints.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(Arc::new(OpenAiCompatibleAdapter::openai()));
        registry.insert(Arc::new(AnthropicAdapter::default()));
        registry.insert(Arc::new(GeminiAdapter::default()));
        registry.insert(Arc::new(OpenAiCompatibleAdapter::grok()));
        registry
    }

    /// All four providers, honoring `MAPI_<PROVIDER>_BASE_URL` / `MAPI_<PROVIDER>_MODEL`.
    pub fn from_env() -> Result<Self, GenerationError> {
        let mut registry = Self::new();
        registry.register(OpenAiCompatibleAdapter::from_env(ProviderKind::OpenAi)?)?;
        registry.register(AnthropicAdapter::from_env()?)?;
        registry.register(GeminiAdapter::from_env()?)?;
        registry.register(OpenAiCompatibleAdapter::from_env(ProviderKind::Grok)?)?;
        Ok(registry)
    }

    pub fn register<P>(&mut self, provider: P) -> Result<(), GenerationError>
    where
        P: ProviderAdapter + 'static,
    {
        self.register_shared(Arc::new(provider))
    }

    pub fn register_shared(
        &mut self,
        provider: Arc<dyn ProviderAdapter>,
    ) -> Result<(), GenerationError> {
        let kind = provider.kind();
        if self.providers.contains_key(&kind) {
            return Err(GenerationError::configuration(format!(
                "provider '{kind}' is already registered"
            )));
        }

        self.insert(provider);
        Ok(())
    }

    /// Replaces whatever adapter is registered for the same provider.
    pub fn replace<P>(&mut self, provider: P)
    where
        P: ProviderAdapter + 'static,
    {
        self.insert(Arc::new(provider));
    }

    fn insert(&mut self, provider: Arc<dyn ProviderAdapter>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn resolve(
        &self,
        kind: ProviderKind,
    ) -> Result<Arc<dyn ProviderAdapter>, GenerationError> {
        self.providers.get(&kind).map(Arc::clone).ok_or_else(|| {
            GenerationError::configuration(format!("provider '{kind}' is not registered"))
        })
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
