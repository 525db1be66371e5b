use thiserror::Error;

use super::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorCategory {
    UserActionRequired,
    TemporaryFailure,
    InternalFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("no API key is configured for provider '{provider}'")]
    MissingCredential { provider: ProviderKind },
    #[error("{provider} API returned HTTP {status}: {message}")]
    ProviderHttp {
        provider: ProviderKind,
        status: u16,
        message: String,
    },
    #[error("model output is not recognized Mermaid diagram source")]
    InvalidDiagramFormat,
    #[error("provider transport failed: {message}")]
    Network { message: String },
    #[error("provider returned an invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("invalid configuration: {message}")]
    Configuration { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GenerationError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn category(&self) -> GenerationErrorCategory {
        match self {
            Self::EmptyPrompt
            | Self::MissingCredential { .. }
            | Self::InvalidDiagramFormat
            | Self::Configuration { .. } => GenerationErrorCategory::UserActionRequired,
            Self::ProviderHttp { status, .. } if matches!(status, 401 | 403) => {
                GenerationErrorCategory::UserActionRequired
            }
            Self::ProviderHttp { .. } | Self::Network { .. } => {
                GenerationErrorCategory::TemporaryFailure
            }
            Self::InvalidResponse { .. } | Self::Internal { .. } => {
                GenerationErrorCategory::InternalFailure
            }
        }
    }

    /// True when the caller should ask the user for an API key before retrying.
    pub fn requires_credential_entry(&self) -> bool {
        match self {
            Self::MissingCredential { .. } => true,
            Self::ProviderHttp { status, .. } => *status == 401,
            _ => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyPrompt => {
                "Please enter a description of the diagram you want to create.".to_string()
            }
            Self::MissingCredential { provider } => {
                format!("Please add your {} API key first.", provider.display_name())
            }
            Self::ProviderHttp { message, .. } => message.clone(),
            Self::InvalidDiagramFormat => {
                "The AI did not return valid Mermaid code. \
                 Please try rephrasing your prompt or make it more specific."
                    .to_string()
            }
            Self::Network { message } => {
                format!("Could not reach the provider service: {message}")
            }
            Self::InvalidResponse { message } => {
                format!("The provider returned an unexpected response: {message}")
            }
            Self::Configuration { message } => {
                format!("Please review your configuration: {message}")
            }
            Self::Internal { message } => {
                format!("Failed to generate diagram. Please try again later. ({message})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerationError, GenerationErrorCategory};
    use crate::domain::ProviderKind;

    #[test]
    fn category_maps_user_action_errors() {
        assert_eq!(
            GenerationError::EmptyPrompt.category(),
            GenerationErrorCategory::UserActionRequired
        );
        assert_eq!(
            GenerationError::MissingCredential {
                provider: ProviderKind::Gemini
            }
            .category(),
            GenerationErrorCategory::UserActionRequired
        );
        assert_eq!(
            GenerationError::InvalidDiagramFormat.category(),
            GenerationErrorCategory::UserActionRequired
        );
        assert_eq!(
            GenerationError::ProviderHttp {
                provider: ProviderKind::OpenAi,
                status: 401,
                message: "Incorrect API key provided".to_string(),
            }
            .category(),
            GenerationErrorCategory::UserActionRequired
        );
    }

    #[test]
    fn category_maps_temporary_and_internal_errors() {
        assert_eq!(
            GenerationError::ProviderHttp {
                provider: ProviderKind::Anthropic,
                status: 529,
                message: "Overloaded".to_string(),
            }
            .category(),
            GenerationErrorCategory::TemporaryFailure
        );
        assert_eq!(
            GenerationError::network("connection reset").category(),
            GenerationErrorCategory::TemporaryFailure
        );
        assert_eq!(
            GenerationError::invalid_response("missing choices").category(),
            GenerationErrorCategory::InternalFailure
        );
    }

    #[test]
    fn requires_credential_entry_for_missing_or_rejected_keys() {
        assert!(
            GenerationError::MissingCredential {
                provider: ProviderKind::Grok
            }
            .requires_credential_entry()
        );
        assert!(
            GenerationError::ProviderHttp {
                provider: ProviderKind::Gemini,
                status: 401,
                message: "API key not valid".to_string(),
            }
            .requires_credential_entry()
        );
        assert!(!GenerationError::InvalidDiagramFormat.requires_credential_entry());
    }

    #[test]
    fn user_message_returns_actionable_message() {
        assert!(
            GenerationError::MissingCredential {
                provider: ProviderKind::Anthropic
            }
            .user_message()
            .contains("Anthropic API key")
        );
        assert_eq!(
            GenerationError::InvalidDiagramFormat.user_message(),
            "The AI did not return valid Mermaid code. Please try rephrasing your prompt or make it more specific."
        );
        assert_eq!(
            GenerationError::ProviderHttp {
                provider: ProviderKind::OpenAi,
                status: 429,
                message: "Rate limit reached".to_string(),
            }
            .user_message(),
            "Rate limit reached"
        );
    }
}
