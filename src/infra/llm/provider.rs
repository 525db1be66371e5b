use std::fmt;

use serde_json::Value;

use crate::domain::{GenerationError, ProviderKind};

/// Per-provider wiring: how to shape the outbound call and where the generated
/// text lives in the reply. Adapters hold no per-call state.
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Fully-qualified endpoint URL, without credentials.
    fn endpoint_url(&self) -> String;

    fn build_request(
        &self,
        prompt: &str,
        credential: &str,
    ) -> Result<OutboundRequest, GenerationError>;

    fn extract_text(&self, response_body: &str) -> Result<String, GenerationError>;
}

/// Where the credential goes on the wire.
#[derive(Clone, PartialEq, Eq)]
pub enum RequestAuth {
    Bearer(String),
    Header { name: &'static str, value: String },
    QueryParam { name: &'static str, value: String },
}

impl fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Header { name, .. } => write!(f, "Header({name}: <redacted>)"),
            Self::QueryParam { name, .. } => write!(f, "QueryParam({name}=<redacted>)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub auth: RequestAuth,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}
