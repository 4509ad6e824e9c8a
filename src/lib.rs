//! mediq - clinical question answering over patient records.
//!
//! The retrieval core: per-scope vector indexes over stored records,
//! evidence composition, and a three-tier answer pipeline
//! (evidence-grounded LLM -> deterministic local rendering -> fixed
//! no-evidence reply).

pub mod answer;
pub mod compose;
pub mod core;
pub mod extract;
pub mod llm;
pub mod retrieval;
pub mod service;
pub mod store;
pub mod utils;

pub use utils::{clean_text, safe_truncate, safe_truncate_ellipsis};

pub use crate::core::config::MediqConfig;
pub use crate::core::error::{MediqError, Result};
pub use llm::embeddings::EmbeddingGenerator;
pub use retrieval::retriever::ContextRetriever;
pub use service::ChatService;
pub use store::{RecordStore, Scope, StoredRecord};

/// Dimension of hash-fallback embeddings (matches nomic-class models).
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Records considered per answer.
pub const DEFAULT_TOP_K: usize = 3;

/// Character budget for a single displayed excerpt.
pub const DEFAULT_EXCERPT_CHARS: usize = 600;

/// Character budget per excerpt when assembling an LLM prompt.
pub const DEFAULT_PROMPT_EXCERPT_CHARS: usize = 1500;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

pub const DEFAULT_CACHE_SIZE: usize = 1000;

pub const DEFAULT_CACHE_TTL: u64 = 300;
