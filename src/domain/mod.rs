mod diagram_source;
mod errors;
mod generation_contract;

pub use diagram_source::{DiagramKind, DiagramSource};
pub use errors::{GenerationError, GenerationErrorCategory};
pub use generation_contract::{GenerationRequest, ProviderKind};
