use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL, safe_truncate};

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiEmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

struct CacheEntry {
    embedding: Vec<f32>,
    created_at: Instant,
}

struct EmbeddingCache {
    cache: RwLock<HashMap<String, CacheEntry>>,
    max_size: usize,
    ttl: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl EmbeddingCache {
    fn new(max_size: usize, ttl_secs: u64) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_size,
            ttl: Duration::from_secs(ttl_secs),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    fn get(&self, text: &str) -> Option<Vec<f32>> {
        let cache = self.cache.read().unwrap();
        if let Some(entry) = cache.get(text) {
            if entry.created_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::SeqCst);
                return Some(entry.embedding.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn set(&self, text: &str, embedding: Vec<f32>) {
        let mut cache = self.cache.write().unwrap();
        if cache.len() >= self.max_size {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.created_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }
        cache.insert(
            text.to_string(),
            CacheEntry {
                embedding,
                created_at: Instant::now(),
            },
        );
    }

    fn clear(&self) {
        self.cache.write().unwrap().clear();
    }

    fn len(&self) -> usize {
        self.cache.read().unwrap().len()
    }
}

/// Text-to-vector backend. Never fails: backend errors degrade to a
/// deterministic hash-seeded vector, empty input yields the zero vector
/// (which downstream ranking treats as unrankable).
pub struct EmbeddingGenerator {
    provider: String,
    url: String,
    model: String,
    api_key: Option<String>,
    dim: usize,
    client: Client,
    cache: EmbeddingCache,
    fallback_count: AtomicUsize,
}

impl EmbeddingGenerator {
    pub fn new(
        provider: impl Into<String>,
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        dim: usize,
        timeout_secs: u64,
    ) -> Self {
        let provider = provider.into().to_lowercase();
        let model = model.into();
        info!(
            "EmbeddingGenerator initialized: provider={}, model={}, dim={}",
            provider, model, dim
        );
        Self {
            provider,
            url: url.into(),
            model,
            api_key,
            dim,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            cache: EmbeddingCache::new(DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL),
            fallback_count: AtomicUsize::new(0),
        }
    }

    /// Offline generator with the deterministic hash backend.
    pub fn hash_only(dim: usize) -> Self {
        Self::new("hash", "", "", None, dim, 30)
    }

    /// Embed `text`. Identical text yields an identical vector within one
    /// process lifetime regardless of backend health.
    pub async fn generate(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            return vec![0.0; self.dim];
        }

        if let Some(cached) = self.cache.get(text) {
            debug!("Cache HIT for: {}...", safe_truncate(text, 50));
            return cached;
        }

        let embedding = match self.provider.as_str() {
            "hash" => hash_embedding(text, self.dim),
            _ => match self.try_generate(text).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    self.fallback_count.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        "Embedding backend unavailable ({}), using hash fallback: {}",
                        self.provider, e
                    );
                    hash_embedding(text, self.dim)
                }
            },
        };

        self.cache.set(text, embedding.clone());
        embedding
    }

    async fn try_generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self.provider.as_str() {
            "ollama" => self.generate_ollama(text).await,
            "openai" => self.generate_openai(text).await,
            other => Err(EmbeddingError::NotImplemented(other.to_string())),
        }
    }

    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.url))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        Ok(response.embedding)
    }

    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;

        let request = OpenAiEmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OpenAiEmbeddingResponse>()
            .await?;

        response
            .data
            .first()
            .map(|d| d.embedding.clone())
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count.load(Ordering::SeqCst)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Lifetime `(hits, misses)` of the in-process cache.
    pub fn cache_stats(&self) -> (usize, usize) {
        (
            self.cache.hits.load(Ordering::SeqCst),
            self.cache.misses.load(Ordering::SeqCst),
        )
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Embedding cache cleared");
    }
}

/// Deterministic pseudo-random vector keyed by a stable hash of the text.
/// Semantically meaningless similarity, but the pipeline never stalls on a
/// dead embedding backend.
fn hash_embedding(text: &str, dim: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut state = u64::from_le_bytes(digest[..8].try_into().unwrap());

    (0..dim)
        .map(|_| {
            // splitmix64
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;
            (z >> 11) as f32 / (1u64 << 53) as f32
        })
        .collect()
}
