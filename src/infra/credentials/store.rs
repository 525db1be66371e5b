use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::domain::ProviderKind;

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential file {path} is not valid JSON: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("credentials could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no configuration directory could be determined for this user")]
    NoConfigDir,
}

/// Durable per-provider secrets plus the last selected provider.
///
/// Blank secrets are never stored: `set` with a blank secret behaves like
/// `delete`, and `get` never returns an empty string.
pub trait CredentialStore: Send + Sync {
    fn get(&self, provider: ProviderKind) -> Result<Option<String>, CredentialStoreError>;

    fn set(&self, provider: ProviderKind, secret: &str) -> Result<(), CredentialStoreError>;

    fn delete(&self, provider: ProviderKind) -> Result<(), CredentialStoreError>;

    fn selected_provider(&self) -> Result<Option<ProviderKind>, CredentialStoreError>;

    fn select_provider(&self, provider: ProviderKind) -> Result<(), CredentialStoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    state: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    selected_provider: Option<ProviderKind>,
    credentials: BTreeMap<ProviderKind, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(provider: ProviderKind, secret: &str) -> Self {
        let store = Self::new();
        let mut state = store.lock();
        state.selected_provider = Some(provider);
        if !secret.trim().is_empty() {
            state.credentials.insert(provider, secret.to_string());
        }
        drop(state);
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, provider: ProviderKind) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.lock().credentials.get(&provider).cloned())
    }

    fn set(&self, provider: ProviderKind, secret: &str) -> Result<(), CredentialStoreError> {
        let mut state = self.lock();
        if secret.trim().is_empty() {
            state.credentials.remove(&provider);
        } else {
            state.credentials.insert(provider, secret.to_string());
        }
        Ok(())
    }

    fn delete(&self, provider: ProviderKind) -> Result<(), CredentialStoreError> {
        self.lock().credentials.remove(&provider);
        Ok(())
    }

    fn selected_provider(&self) -> Result<Option<ProviderKind>, CredentialStoreError> {
        Ok(self.lock().selected_provider)
    }

    fn select_provider(&self, provider: ProviderKind) -> Result<(), CredentialStoreError> {
        self.lock().selected_provider = Some(provider);
        Ok(())
    }
}
