pub mod context_provider;
pub mod llm_service;
pub mod text_generator;

pub use context_provider::{ContextProvider, PlaceholderContextProvider};
pub use llm_service::LlmService;
pub use text_generator::{GenerationRequest, TextGenerator};
