use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{GenerationError, ProviderKind};

use super::env::read_endpoint_override;
use super::{OutboundRequest, PromptBuilder, ProviderAdapter, RequestAuth};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const GROK_BASE_URL: &str = "https://api.x.ai";
const GROK_MODEL: &str = "grok-2-latest";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u16 = 2000;

/// Chat-completions wiring shared by OpenAI and xAI Grok: bearer auth,
/// system + user messages, reply text at `choices[0].message.content`.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleAdapter {
    kind: ProviderKind,
    api_base_url: String,
    model: String,
}

impl OpenAiCompatibleAdapter {
    pub fn openai() -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            api_base_url: OPENAI_BASE_URL.to_string(),
            model: OPENAI_MODEL.to_string(),
        }
    }

    pub fn grok() -> Self {
        Self {
            kind: ProviderKind::Grok,
            api_base_url: GROK_BASE_URL.to_string(),
            model: GROK_MODEL.to_string(),
        }
    }

    pub fn from_env(kind: ProviderKind) -> Result<Self, GenerationError> {
        let defaults = match kind {
            ProviderKind::OpenAi => Self::openai(),
            ProviderKind::Grok => Self::grok(),
            other => {
                return Err(GenerationError::configuration(format!(
                    "provider '{other}' does not speak the chat-completions protocol"
                )));
            }
        };

        let overrides = read_endpoint_override(kind)?;
        Self::with_config(
            kind,
            overrides.base_url.unwrap_or(defaults.api_base_url),
            overrides.model.unwrap_or(defaults.model),
        )
    }

    pub fn with_config(
        kind: ProviderKind,
        api_base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        if !matches!(kind, ProviderKind::OpenAi | ProviderKind::Grok) {
            return Err(GenerationError::configuration(format!(
                "provider '{kind}' does not speak the chat-completions protocol"
            )));
        }

        let api_base_url = api_base_url.into();
        if api_base_url.trim().is_empty() {
            return Err(GenerationError::configuration(format!(
                "{} API base URL must not be empty",
                kind.display_name()
            )));
        }

        let model = model.into();
        if model.trim().is_empty() {
            return Err(GenerationError::configuration(format!(
                "{} model must not be empty",
                kind.display_name()
            )));
        }

        Ok(Self {
            kind,
            api_base_url: api_base_url.trim().to_string(),
            model: model.trim().to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_payload(&self, prompt: &str) -> ChatCompletionsRequest {
        let prompt = PromptBuilder::build(prompt);

        ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessageRequest {
                    role: "system".to_string(),
                    content: prompt.system,
                },
                ChatMessageRequest {
                    role: "user".to_string(),
                    content: prompt.user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn endpoint_url(&self) -> String {
        build_v1_url(&self.api_base_url, "chat/completions")
    }

    fn build_request(
        &self,
        prompt: &str,
        credential: &str,
    ) -> Result<OutboundRequest, GenerationError> {
        let body = serde_json::to_value(self.build_request_payload(prompt)).map_err(|err| {
            GenerationError::internal(format!(
                "failed to serialize {} request: {err}",
                self.kind.display_name()
            ))
        })?;

        Ok(OutboundRequest {
            url: self.endpoint_url(),
            auth: RequestAuth::Bearer(credential.to_string()),
            headers: Vec::new(),
            body,
        })
    }

    fn extract_text(&self, response_body: &str) -> Result<String, GenerationError> {
        let response: ChatCompletionsResponse =
            serde_json::from_str(response_body).map_err(|err| {
                GenerationError::invalid_response(format!(
                    "{} response decode failed: {err}",
                    self.kind.display_name()
                ))
            })?;

        response
            .choices
            .first()
            .and_then(ChatChoice::extract_text)
            .ok_or_else(|| {
                GenerationError::invalid_response(format!(
                    "{} response did not include choices[0].message.content",
                    self.kind.display_name()
                ))
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessageRequest>,
    temperature: f64,
    max_tokens: u16,
}

#[derive(Debug, Serialize)]
struct ChatMessageRequest {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

impl ChatChoice {
    fn extract_text(&self) -> Option<String> {
        let content = self.message.as_ref()?.content.as_ref()?;
        extract_message_content(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

// Some compatible servers return content as an array of typed parts.
fn extract_message_content(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => non_empty_owned(text),
        Value::Array(parts) => {
            let joined = parts
                .iter()
                .filter_map(extract_content_part_text)
                .collect::<String>();
            non_empty_owned(&joined)
        }
        _ => None,
    }
}

fn extract_content_part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(text) => Some(text.to_string()),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        _ => None,
    }
}

fn non_empty_owned(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(super) fn build_v1_url(api_base_url: &str, endpoint_path: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    let endpoint_path = endpoint_path.trim_start_matches('/');

    if base.ends_with("/v1") {
        format!("{base}/{endpoint_path}")
    } else {
        format!("{base}/v1/{endpoint_path}")
    }
}
