use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::local;
use super::prompt;
use crate::compose::EvidenceComposer;
use crate::llm::providers::base::{LlmProvider, LlmProviderError};
use crate::retrieval::ScoredDocument;

/// Classified result of one augmented-generation attempt. A soft failure
/// is a recognized external-dependency problem (auth, quota, config) that
/// the engine absorbs; a hard failure is anything else. Both substitute
/// the local output and neither reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Answered(String),
    SoftFailure(String),
    HardFailure(String),
}

/// Where the final reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    AugmentedEvidence,
    AugmentedGeneral,
    LocalEvidence,
    LocalNoEvidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub reply: String,
    pub source: AnswerSource,
    /// Populated when an augmented attempt was made and substituted.
    pub fallback_reason: Option<String>,
}

/// Error prose some backends return inside an HTTP 200 body. Last-resort
/// heuristic only; structured error classification runs first.
const SOFT_FAILURE_MARKERS: &[&str] = &[
    "api key not valid",
    "api_key_invalid",
    "permission denied",
    "permission_denied",
    "quota exceeded",
    "resource_exhausted",
    "billing account",
];

/// Three-tier answer orchestration: evidence-grounded augmented generation,
/// deterministic local templating, fixed no-evidence reply. The local
/// output is always computed first and is the substitute for every
/// augmented failure path.
pub struct AnswerEngine {
    provider: Option<Arc<dyn LlmProvider>>,
    display_composer: EvidenceComposer,
    prompt_composer: EvidenceComposer,
}

impl AnswerEngine {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        display_chars: usize,
        prompt_chars: usize,
    ) -> Self {
        info!(
            "AnswerEngine initialized (augmented={})",
            provider
                .as_ref()
                .map(|p| p.provider_name().to_string())
                .unwrap_or_else(|| "disabled".to_string())
        );
        Self {
            provider,
            display_composer: EvidenceComposer::new(display_chars),
            prompt_composer: EvidenceComposer::new(prompt_chars),
        }
    }

    pub async fn answer(&self, question: &str, documents: &[ScoredDocument]) -> Answer {
        let display_context = self.display_composer.compose(documents);
        let local_reply = local::render(&display_context);
        let local_source = if display_context.is_empty() {
            AnswerSource::LocalNoEvidence
        } else {
            AnswerSource::LocalEvidence
        };

        let Some(provider) = &self.provider else {
            return Answer {
                reply: local_reply,
                source: local_source,
                fallback_reason: None,
            };
        };

        let prompt_context = self.prompt_composer.compose(documents);
        let (system, user, augmented_source) = if prompt_context.is_empty() {
            (
                prompt::GENERAL_SYSTEM_PROMPT,
                prompt::general_prompt(question),
                AnswerSource::AugmentedGeneral,
            )
        } else {
            (
                prompt::EVIDENCE_SYSTEM_PROMPT,
                prompt::evidence_prompt(question, &prompt_context),
                AnswerSource::AugmentedEvidence,
            )
        };

        let outcome = match provider.generate(system, &user).await {
            Ok((text, metadata)) => {
                debug!(
                    "Augmented generation via {} ({:?} tokens)",
                    metadata.provider, metadata.tokens_total
                );
                classify_response(&text)
            }
            Err(e) => classify_error(&e),
        };

        match outcome {
            GenerationOutcome::Answered(text) => Answer {
                reply: text,
                source: augmented_source,
                fallback_reason: None,
            },
            GenerationOutcome::SoftFailure(reason) => {
                warn!("Augmented generation soft failure, using local answer: {reason}");
                Answer {
                    reply: local_reply,
                    source: local_source,
                    fallback_reason: Some(reason),
                }
            }
            GenerationOutcome::HardFailure(reason) => {
                warn!("Augmented generation failed, using local answer: {reason}");
                Answer {
                    reply: local_reply,
                    source: local_source,
                    fallback_reason: Some(reason),
                }
            }
        }
    }
}

/// Structured classification of a provider error. Auth/quota/config
/// responses are soft; transport faults and timeouts are hard.
pub fn classify_error(error: &LlmProviderError) -> GenerationOutcome {
    if error.is_timeout() {
        return GenerationOutcome::HardFailure(format!("timeout: {error}"));
    }
    match error {
        LlmProviderError::Http(_) => match error.status() {
            Some(status) if status.is_client_error() => {
                GenerationOutcome::SoftFailure(format!("HTTP {status}: {error}"))
            }
            _ => GenerationOutcome::HardFailure(error.to_string()),
        },
        LlmProviderError::Provider(reason) => GenerationOutcome::SoftFailure(reason.clone()),
        LlmProviderError::Json(_) | LlmProviderError::Internal(_) => {
            GenerationOutcome::HardFailure(error.to_string())
        }
    }
}

/// Classify generated text. Empty output and known error prose count as
/// soft failures; everything else is an answer.
pub fn classify_response(text: &str) -> GenerationOutcome {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return GenerationOutcome::SoftFailure("empty response".to_string());
    }
    let lowered = trimmed.to_lowercase();
    for marker in SOFT_FAILURE_MARKERS {
        if lowered.contains(marker) {
            return GenerationOutcome::SoftFailure(format!("error marker in response: {marker}"));
        }
    }
    GenerationOutcome::Answered(trimmed.to_string())
}
