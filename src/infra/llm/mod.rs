mod anthropic;
pub(crate) mod env;
mod gemini;
mod http_transport;
mod openai_compatible;
mod prompt_builder;
mod provider;
mod provider_registry;
mod response_parsing;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use http_transport::{DEFAULT_TIMEOUT, HttpTransport};
pub use openai_compatible::OpenAiCompatibleAdapter;
pub use prompt_builder::{BuiltPrompt, PromptBuilder};
pub use provider::{OutboundRequest, ProviderAdapter, RequestAuth};
pub use provider_registry::ProviderRegistry;
pub use response_parsing::sanitize_diagram_source;
