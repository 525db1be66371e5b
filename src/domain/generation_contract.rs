use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GenerationError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Gemini,
    Grok,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [Self::OpenAi, Self::Anthropic, Self::Gemini, Self::Grok];

    pub fn id(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Grok => "grok",
        }
    }

    /// Short name used in notifications, e.g. "Please add your Gemini API key".
    pub fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Gemini",
            Self::Grok => "Grok",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI (GPT-4o, GPT-3.5, etc.)",
            Self::Anthropic => "Anthropic (Claude)",
            Self::Gemini => "Google Gemini",
            Self::Grok => "xAI Grok",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == normalized)
            .ok_or_else(|| {
                GenerationError::configuration(format!(
                    "unknown provider '{}' (expected one of: openai, anthropic, gemini, grok)",
                    value.trim()
                ))
            })
    }
}

/// One user-triggered generation. Built fresh per call and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub provider: ProviderKind,
    pub credential: String,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        provider: ProviderKind,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            provider,
            credential: credential.into(),
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        if self.credential.trim().is_empty() {
            return Err(GenerationError::MissingCredential {
                provider: self.provider,
            });
        }
        Ok(())
    }
}

// The credential must never end up in logs through `{:?}`.
impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("prompt", &self.prompt)
            .field("provider", &self.provider)
            .field("credential", &"<redacted>")
            .finish()
    }
}
