use std::sync::Arc;
use tracing::warn;

use super::embeddings::EmbeddingGenerator;
use super::providers::base::LlmProvider;
use super::providers::gemini::GeminiProvider;
use super::providers::ollama::OllamaProvider;
use crate::DEFAULT_OLLAMA_URL;
use crate::core::config::MediqConfig;

pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Build the configured external generator, or `None` when generation
    /// should stay local-only (unset provider, missing key, unknown name).
    #[must_use]
    pub fn from_config(config: &MediqConfig) -> Option<Arc<dyn LlmProvider>> {
        match config.llm_provider.as_str() {
            "none" | "" => None,
            "gemini" => {
                let api_key = config.llm_api_key.as_deref().unwrap_or("");
                if api_key.trim().is_empty() {
                    warn!("Gemini selected but no API key configured, staying local-only");
                    return None;
                }
                Some(Arc::new(GeminiProvider::new(
                    api_key,
                    config.llm_model.clone(),
                    config.llm_temperature,
                    config.timeout,
                )))
            }
            "ollama" => Some(Arc::new(OllamaProvider::new(
                config
                    .llm_base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                config.llm_model.clone(),
                config.llm_temperature,
                config.timeout,
            ))),
            other => {
                warn!("Unknown LLM provider '{}', staying local-only", other);
                None
            }
        }
    }
}

pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    #[must_use]
    pub fn from_config(config: &MediqConfig) -> EmbeddingGenerator {
        EmbeddingGenerator::new(
            config.embedding_provider.clone(),
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
            config.embedding_dim,
            config.timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_provider_stays_local() {
        let config = MediqConfig::default();
        assert!(LlmProviderFactory::from_config(&config).is_none());
    }

    #[test]
    fn test_gemini_without_key_stays_local() {
        let mut config = MediqConfig::default();
        config.llm_provider = "gemini".to_string();
        assert!(LlmProviderFactory::from_config(&config).is_none());
    }

    #[test]
    fn test_gemini_with_key() {
        let mut config = MediqConfig::default();
        config.llm_provider = "gemini".to_string();
        config.llm_api_key = Some("test-key".to_string());
        let provider = LlmProviderFactory::from_config(&config).unwrap();
        assert_eq!(provider.provider_name(), "gemini");
    }

    #[test]
    fn test_ollama_provider() {
        let mut config = MediqConfig::default();
        config.llm_provider = "ollama".to_string();
        config.llm_model = "llama3.2".to_string();
        let provider = LlmProviderFactory::from_config(&config).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "llama3.2");
    }
}
