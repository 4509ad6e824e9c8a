pub mod embeddings;
pub mod factory;
pub mod providers;

pub use embeddings::EmbeddingGenerator;
pub use factory::LlmProviderFactory;
pub use providers::base::{LlmMetadata, LlmProvider, LlmProviderError};
