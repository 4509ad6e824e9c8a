use serde::{Deserialize, Serialize};

use crate::core::error::{MediqError, Result};
use crate::{
    DEFAULT_EMBEDDING_DIM, DEFAULT_EMBEDDING_MODEL, DEFAULT_EXCERPT_CHARS, DEFAULT_OLLAMA_URL,
    DEFAULT_PROMPT_EXCERPT_CHARS, DEFAULT_TOP_K,
};

/// Process configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediqConfig {
    /// Embedding backend: "hash" (deterministic, offline), "ollama", "openai".
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_dim: usize,

    /// External answer generator: "gemini", "ollama", or "none".
    pub llm_provider: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_temperature: f64,

    pub timeout: u64,
    pub top_k: usize,
    pub excerpt_chars: usize,
    pub prompt_excerpt_chars: usize,
}

impl MediqConfig {
    pub fn new() -> Self {
        Self {
            embedding_provider: "hash".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,

            llm_provider: "none".to_string(),
            llm_model: "gemini-2.5-flash".to_string(),
            llm_api_key: None,
            llm_base_url: None,
            llm_temperature: 0.3,

            timeout: 30,
            top_k: DEFAULT_TOP_K,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            prompt_excerpt_chars: DEFAULT_PROMPT_EXCERPT_CHARS,
        }
    }

    /// Whether an external generator should be attempted at all.
    pub fn llm_configured(&self) -> bool {
        match self.llm_provider.as_str() {
            "none" | "" => false,
            "gemini" => self.llm_api_key.as_deref().is_some_and(|k| !k.trim().is_empty()),
            _ => true,
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(provider) = std::env::var("MEDIQ_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("MEDIQ_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(url) = std::env::var("MEDIQ_EMBEDDING_URL") {
            config.embedding_url = url;
        }
        if let Ok(key) = std::env::var("MEDIQ_EMBEDDING_API_KEY") {
            config.embedding_api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("MEDIQ_EMBEDDING_DIM") {
            config.embedding_dim = parse_env_usize("MEDIQ_EMBEDDING_DIM", &dim)?;
        }
        if let Ok(provider) = std::env::var("MEDIQ_LLM_PROVIDER") {
            config.llm_provider = provider;
        }
        if let Ok(model) = std::env::var("MEDIQ_LLM_MODEL") {
            config.llm_model = model;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.llm_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("MEDIQ_LLM_API_KEY") {
            config.llm_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("MEDIQ_LLM_BASE_URL") {
            config.llm_base_url = Some(url);
        }
        if let Ok(k) = std::env::var("MEDIQ_TOP_K") {
            config.top_k = parse_env_usize("MEDIQ_TOP_K", &k)?;
        }

        Ok(config)
    }
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.parse().map_err(|_| {
        MediqError::Configuration(format!("{name} must be a positive integer, got '{raw}'"))
    })
}

impl Default for MediqConfig {
    fn default() -> Self {
        Self::new()
    }
}
