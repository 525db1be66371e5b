use serde::{Deserialize, Serialize};

use crate::domain::{GenerationError, ProviderKind};

use super::env::read_endpoint_override;
use super::{OutboundRequest, PromptBuilder, ProviderAdapter, RequestAuth};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-pro";
const API_KEY_PARAM: &str = "key";

#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    api_base_url: String,
    model: String,
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl GeminiAdapter {
    pub fn from_env() -> Result<Self, GenerationError> {
        let overrides = read_endpoint_override(ProviderKind::Gemini)?;
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
                "Gemini API base URL must not be empty",
            ));
        }

        let model = model.into();
        let model = model.trim().trim_start_matches("models/");
        if model.is_empty() || model.contains('/') {
            return Err(GenerationError::configuration(format!(
                "Gemini model must be a single model ID (got '{model}')"
            )));
        }

        Ok(Self {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model
        )
    }

    fn build_request(
        &self,
        prompt: &str,
        credential: &str,
    ) -> Result<OutboundRequest, GenerationError> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: PromptBuilder::build(prompt).combined(),
                }],
            }],
        };
        let body = serde_json::to_value(payload).map_err(|err| {
            GenerationError::internal(format!("failed to serialize Gemini request: {err}"))
        })?;

        Ok(OutboundRequest {
            url: self.endpoint_url(),
            auth: RequestAuth::QueryParam {
                name: API_KEY_PARAM,
                value: credential.to_string(),
            },
            headers: Vec::new(),
            body,
        })
    }

    fn extract_text(&self, response_body: &str) -> Result<String, GenerationError> {
        let response: GenerateContentResponse =
            serde_json::from_str(response_body).map_err(|err| {
                GenerationError::invalid_response(format!("Gemini response decode failed: {err}"))
            })?;

        let text = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty());

        if let Some(text) = text {
            return Ok(text.to_string());
        }

        let block_reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        Err(match block_reason {
            Some(reason) => {
                GenerationError::invalid_response(format!("Gemini blocked the prompt: {reason}"))
            }
            None => GenerationError::invalid_response(
                "Gemini response did not include candidates[0].content.parts[0].text",
            ),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
