mod generation_service;
mod placeholder;

pub use generation_service::{DEFAULT_OFFLINE_DELAY, DiagramGenerationService, GenerationSettings};
pub use placeholder::placeholder_diagram;
