pub mod credentials;
pub mod llm;
