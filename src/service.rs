//! The operation surface exposed to the request layer: `answer`, `ingest`,
//! `health`. `answer` never fails; every failure path resolves to a
//! populated reply string.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::answer::AnswerEngine;
use crate::core::config::MediqConfig;
use crate::core::error::{MediqError, Result};
use crate::extract::{display_name, extract_patient_info};
use crate::llm::factory::{EmbeddingProviderFactory, LlmProviderFactory};
use crate::retrieval::ContextRetriever;
use crate::store::{RecordStore, Scope, StoredRecord};

pub const EMPTY_QUESTION_REPLY: &str = "Please send a valid question.";

pub const INTERNAL_ERROR_REPLY: &str =
    "An error occurred while answering your question. Please try again.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub record_id: Uuid,
    pub patient_id: Option<String>,
    /// Extracted identity label for records ingested without a patient id.
    pub display_name: Option<String>,
}

pub struct ChatService {
    store: Arc<dyn RecordStore>,
    retriever: ContextRetriever,
    engine: AnswerEngine,
    top_k: usize,
}

impl ChatService {
    pub fn new(config: &MediqConfig, store: Arc<dyn RecordStore>) -> Self {
        let embedder = Arc::new(EmbeddingProviderFactory::from_config(config));
        let retriever = ContextRetriever::new(Arc::clone(&store), embedder);
        let engine = AnswerEngine::new(
            LlmProviderFactory::from_config(config),
            config.excerpt_chars,
            config.prompt_excerpt_chars,
        );
        info!("ChatService initialized (top_k={})", config.top_k);
        Self {
            store,
            retriever,
            engine,
            top_k: config.top_k,
        }
    }

    /// Answer a free-text question, optionally scoped to a patient id.
    pub async fn answer(&self, question: &str, patient_id: Option<&str>) -> Reply {
        // outermost boundary: an unexpected panic anywhere in the pipeline
        // becomes a fixed reply, never a crashed request
        match AssertUnwindSafe(self.answer_inner(question, patient_id))
            .catch_unwind()
            .await
        {
            Ok(reply) => reply,
            Err(_) => {
                error!("Unexpected panic while answering question");
                Reply {
                    reply: INTERNAL_ERROR_REPLY.to_string(),
                }
            }
        }
    }

    async fn answer_inner(&self, question: &str, patient_id: Option<&str>) -> Reply {
        if question.trim().is_empty() {
            return Reply {
                reply: EMPTY_QUESTION_REPLY.to_string(),
            };
        }

        let scope = match patient_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Scope::patient(id),
            None => Scope::Global,
        };

        let documents = self.retriever.retrieve(&scope, question, self.top_k).await;
        let answer = self.engine.answer(question, &documents).await;
        Reply {
            reply: answer.reply,
        }
    }

    /// Store a document. Without an explicit patient id the extractor runs
    /// to recover searchable identity fields. The affected scope indexes
    /// are invalidated before this returns.
    pub fn ingest(
        &self,
        filename: &str,
        content: &str,
        patient_id: Option<&str>,
    ) -> Result<IngestReceipt> {
        if filename.trim().is_empty() {
            return Err(MediqError::Validation("filename must not be empty".to_string()));
        }
        if content.trim().is_empty() {
            return Err(MediqError::Validation(
                "document content must not be empty".to_string(),
            ));
        }

        let explicit = patient_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);

        let mut record = StoredRecord::new(explicit.clone(), filename, content);
        let mut label = None;

        if explicit.is_none() {
            let info = extract_patient_info(content);
            if !info.is_empty() {
                label = Some(display_name(&info));
                record.extracted = Some(info);
            }
        }

        let receipt = IngestReceipt {
            record_id: record.id,
            patient_id: explicit.clone(),
            display_name: label,
        };
        let extracted_id = record
            .extracted
            .as_ref()
            .and_then(|info| info.patient_id.clone());

        self.store.add_record(record);

        match &explicit {
            Some(id) => self.retriever.invalidate(&Scope::patient(id.clone())),
            None => self.retriever.invalidate(&Scope::Global),
        }
        // an unscoped upload may satisfy a patient scope that previously
        // resolved through the identity fallback
        if let Some(id) = extracted_id {
            self.retriever.invalidate(&Scope::patient(id));
        }

        info!(
            "Ingested {} (patient={})",
            filename,
            receipt.patient_id.as_deref().unwrap_or("-")
        );
        Ok(receipt)
    }

    /// Trivial liveness check.
    pub fn health(&self) -> &'static str {
        "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::NO_EVIDENCE_REPLY;
    use crate::store::MemoryRecordStore;

    fn local_only_service() -> (ChatService, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ChatService::new(&MediqConfig::default(), store.clone());
        (service, store)
    }

    #[tokio::test]
    async fn test_scoped_question_answers_from_records() {
        let (service, _store) = local_only_service();
        service
            .ingest("visit.txt", "DIAGNOSIS: Type 2 Diabetes", Some("P001"))
            .unwrap();

        let reply = service.answer("What is the diagnosis?", Some("P001")).await;
        assert!(reply.reply.contains("Type 2 Diabetes"));
    }

    #[tokio::test]
    async fn test_empty_corpus_yields_fixed_no_evidence_reply() {
        let (service, _store) = local_only_service();
        let reply = service.answer("What is the treatment?", None).await;
        assert_eq!(reply.reply, NO_EVIDENCE_REPLY);
    }

    #[tokio::test]
    async fn test_empty_question_short_circuits() {
        let (service, _store) = local_only_service();
        let reply = service.answer("   ", Some("P001")).await;
        assert_eq!(reply.reply, EMPTY_QUESTION_REPLY);
    }

    #[tokio::test]
    async fn test_unknown_patient_yields_no_evidence_reply() {
        let (service, _store) = local_only_service();
        service
            .ingest("visit.txt", "DIAGNOSIS: asthma", Some("P001"))
            .unwrap();

        let reply = service.answer("What is the diagnosis?", Some("P999")).await;
        assert_eq!(reply.reply, NO_EVIDENCE_REPLY);
    }

    #[tokio::test]
    async fn test_ingest_is_visible_to_next_question() {
        let (service, _store) = local_only_service();
        service
            .ingest("a.txt", "Initial visit, mild fever", Some("P001"))
            .unwrap();
        let _ = service.answer("fever?", Some("P001")).await;

        // second ingest after the index was built and cached
        service
            .ingest("b.txt", "DIAGNOSIS: influenza confirmed", Some("P001"))
            .unwrap();
        let reply = service.answer("What was confirmed?", Some("P001")).await;
        assert!(reply.reply.contains("influenza"));
    }

    #[tokio::test]
    async fn test_unscoped_upload_found_by_extracted_id() {
        let (service, _store) = local_only_service();
        let receipt = service
            .ingest(
                "walkin.txt",
                "Name: Jane Q Public Age: 45 Gender: F ID: 4471\nDIAGNOSIS: seasonal allergies",
                None,
            )
            .unwrap();
        assert_eq!(receipt.display_name.as_deref(), Some("Jane Q Public (45F)"));

        let reply = service.answer("What is the diagnosis?", Some("4471")).await;
        assert!(reply.reply.contains("seasonal allergies"));
    }

    #[tokio::test]
    async fn test_unscoped_question_searches_whole_corpus() {
        let (service, _store) = local_only_service();
        service
            .ingest("visit.txt", "DIAGNOSIS: Type 2 Diabetes", Some("P001"))
            .unwrap();

        let reply = service.answer("What conditions are on file?", None).await;
        assert!(reply.reply.contains("Type 2 Diabetes"));
    }

    #[test]
    fn test_ingest_rejects_blank_input() {
        let (service, store) = local_only_service();
        assert!(matches!(
            service.ingest("visit.txt", "   \n", Some("P001")),
            Err(MediqError::Validation(_))
        ));
        assert!(matches!(
            service.ingest("", "DIAGNOSIS: asthma", None),
            Err(MediqError::Validation(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_health() {
        let (service, _store) = local_only_service();
        assert_eq!(service.health(), "ok");
    }
}
