use serde::{Deserialize, Serialize};

use crate::domain::{GenerationError, ProviderKind};

use super::env::read_endpoint_override;
use super::openai_compatible::build_v1_url;
use super::{OutboundRequest, PromptBuilder, ProviderAdapter, RequestAuth};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
const MAX_TOKENS: u16 = 2000;

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    api_base_url: String,
    model: String,
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AnthropicAdapter {
    pub fn from_env() -> Result<Self, GenerationError> {
        let overrides = read_endpoint_override(ProviderKind::Anthropic)?;
        Self::with_config(
            overrides
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            overrides.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        )
    }

    pub fn with_config(
        api_base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let api_base_url = api_base_url.into();
        if api_base_url.trim().is_empty() {
            return Err(GenerationError::configuration(
                "Anthropic API base URL must not be empty",
            ));
        }

        let model = model.into();
        if model.trim().is_empty() {
            return Err(GenerationError::configuration(
                "Anthropic model must not be empty",
            ));
        }

        Ok(Self {
            api_base_url: api_base_url.trim().to_string(),
            model: model.trim().to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    // The messages body carries no system role here; instructions lead the user turn.
    fn build_request_payload(&self, prompt: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: PromptBuilder::build(prompt).combined(),
            }],
        }
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn endpoint_url(&self) -> String {
        build_v1_url(&self.api_base_url, "messages")
    }

    fn build_request(
        &self,
        prompt: &str,
        credential: &str,
    ) -> Result<OutboundRequest, GenerationError> {
        let body = serde_json::to_value(self.build_request_payload(prompt)).map_err(|err| {
            GenerationError::internal(format!("failed to serialize Anthropic request: {err}"))
        })?;

        Ok(OutboundRequest {
            url: self.endpoint_url(),
            auth: RequestAuth::Header {
                name: "x-api-key",
                value: credential.to_string(),
            },
            headers: vec![("anthropic-version", API_VERSION.to_string())],
            body,
        })
    }

    fn extract_text(&self, response_body: &str) -> Result<String, GenerationError> {
        let response: MessagesResponse = serde_json::from_str(response_body).map_err(|err| {
            GenerationError::invalid_response(format!("Anthropic response decode failed: {err}"))
        })?;

        response
            .content
            .first()
            .and_then(ContentBlock::as_text)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                GenerationError::invalid_response(
                    "Anthropic response did not include content[0].text",
                )
            })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u16,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ContentBlock {
    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AnthropicAdapter;
    use crate::domain::GenerationError;
    use crate::infra::llm::{PromptBuilder, ProviderAdapter, RequestAuth};

    #[test]
    fn build_request_uses_api_key_header_and_version() {
        let request = AnthropicAdapter::default()
            .build_request("an ER diagram for a library", "sk-ant-test")
            .expect("request should build");

        assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(
            request.auth,
            RequestAuth::Header {
                name: "x-api-key",
                value: "sk-ant-test".to_string(),
            }
        );
        assert_eq!(
            request.headers,
            vec![("anthropic-version", "2023-06-01".to_string())]
        );
    }

    #[test]
    fn build_request_puts_instructions_into_single_user_message() {
        let request = AnthropicAdapter::default()
            .build_request("an ER diagram for a library", "sk-ant-test")
            .expect("request should build");
        let expected = PromptBuilder::build("an ER diagram for a library").combined();

        assert_eq!(request.body["model"], "claude-3-opus-20240229");
        assert_eq!(request.body["max_tokens"], 2000);
        assert_eq!(request.body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(request.body["messages"][0]["role"], "user");
        assert_eq!(request.body["messages"][0]["content"], expected.as_str());
        assert!(request.body.get("system").is_none());
    }

    #[test]
    fn extract_text_reads_first_content_block() {
        let response = r#"{
          "id": "msg_01",
          "type": "message",
          "stop_reason": "end_turn",
          "content": [
            { "type": "text", "text": "\nstateDiagram-v2\n  [*] --> Idle\n" }
          ]
        }"#;

        let text = AnthropicAdapter::default()
            .extract_text(response)
            .expect("text should be extracted");

        assert_eq!(text, "stateDiagram-v2\n  [*] --> Idle");
    }

    #[test]
    fn extract_text_rejects_non_text_first_block() {
        let response = r#"{
          "content": [
            { "type": "tool_use", "id": "toolu_01", "name": "noop", "input": {} }
          ]
        }"#;

        let error = AnthropicAdapter::default()
            .extract_text(response)
            .expect_err("non-text block should fail");

        assert!(matches!(
            error,
            GenerationError::InvalidResponse { message }
            if message == "Anthropic response did not include content[0].text"
        ));
    }

    #[test]
    fn with_config_trims_and_rejects_blank_values() {
        let adapter = AnthropicAdapter::with_config(" https://proxy.local/ ", " claude-3-haiku ")
            .expect("adapter should build");

        assert_eq!(adapter.model(), "claude-3-haiku");
        assert_eq!(adapter.endpoint_url(), "https://proxy.local/v1/messages");
        assert!(matches!(
            AnthropicAdapter::with_config("", "claude-3-haiku"),
            Err(GenerationError::Configuration { .. })
        ));
    }
}
