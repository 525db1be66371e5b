use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::{DiagramKind, GenerationError, ProviderKind};

const MAX_ERROR_MESSAGE_LEN: usize = 256;
const FENCE: &str = "```";

pub(crate) fn truncate_message(body: &str) -> String {
    let compact = body.trim().replace('\n', " ");
    compact.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

/// Unwraps markdown code fences (with or without an info string such as `mermaid`)
/// and trims surrounding whitespace and stray backticks.
pub fn sanitize_diagram_source(text: &str) -> String {
    let unfenced = unwrap_code_fences(text);
    unfenced
        .trim_matches(|c: char| c == '`' || c.is_whitespace())
        .to_string()
}

fn unwrap_code_fences(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        output.push_str(&rest[..open]);

        // A response cut off by the token limit may never close its fence.
        let Some(close) = after_open.find(FENCE) else {
            output.push_str(strip_info_string(after_open));
            return output;
        };

        output.push_str(strip_info_string(&after_open[..close]));
        rest = &after_open[close + FENCE.len()..];
    }

    output.push_str(rest);
    output
}

fn strip_info_string(block: &str) -> &str {
    let Some((first_line, body)) = block.split_once('\n') else {
        return block;
    };

    let tag = first_line.trim();
    let is_info_string = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
        && DiagramKind::detect(tag).is_none();

    if tag.is_empty() || is_info_string {
        body
    } else {
        block
    }
}

pub(crate) fn map_http_error(
    provider: ProviderKind,
    status: StatusCode,
    body: &str,
) -> GenerationError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| format!("API request failed with status {}", status.as_u16()));

    GenerationError::ProviderHttp {
        provider,
        status: status.as_u16(),
        message,
    }
}

/// Pulls `error.message` out of a provider error body. Every supported provider
/// reports failures in that envelope; anything else yields `None`.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok()?;
    let message = envelope.error?.message?;
    let message = truncate_message(&message);
    (!message.is_empty()).then_some(message)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}
