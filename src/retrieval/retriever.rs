use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::index::{IndexCache, IndexEntry, ScopeIndex};
use super::similarity::{cosine_similarity, norm};
use crate::llm::embeddings::EmbeddingGenerator;
use crate::store::{RecordStore, Scope, StoredRecord};
use crate::utils::safe_truncate;

/// A retrieved document. `score` is diagnostic only and absent when the
/// ranking ran in degraded insertion-order mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub record_id: Uuid,
    pub source: String,
    pub text: String,
    pub score: Option<f64>,
}

/// Embeds queries and documents and answers top-k per scope. Owns the
/// per-scope index cache; ingestion must call [`ContextRetriever::invalidate`]
/// before the next query is served.
pub struct ContextRetriever {
    store: Arc<dyn RecordStore>,
    embedder: Arc<EmbeddingGenerator>,
    cache: IndexCache,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn RecordStore>, embedder: Arc<EmbeddingGenerator>) -> Self {
        info!("ContextRetriever initialized");
        Self {
            store,
            embedder,
            cache: IndexCache::new(),
        }
    }

    /// Invalidation hook for ingestion: drops the scope's index and the
    /// global one (every record is part of the global corpus).
    pub fn invalidate(&self, scope: &Scope) {
        self.cache.invalidate(scope);
        self.cache.invalidate(&Scope::Global);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Top-k most relevant records in scope. Empty scope (after the
    /// unscoped identity fallback) yields an empty vec, which callers must
    /// read as "no data", distinct from "no match".
    pub async fn retrieve(&self, scope: &Scope, query: &str, k: usize) -> Vec<ScoredDocument> {
        let index = match self.cache.get(scope) {
            Some(index) => index,
            None => {
                let built = Arc::new(self.build_index(scope).await);
                // an empty patient scope is never cached: a later unscoped
                // upload can satisfy it through the identity fallback
                // without any invalidation naming this scope
                if !built.is_empty() || matches!(scope, Scope::Global) {
                    // racing first-builds are idempotent; last writer wins
                    self.cache.insert(Arc::clone(&built));
                }
                built
            }
        };

        if index.is_empty() {
            info!("No records in scope {}", scope.label());
            return Vec::new();
        }

        let query_vector = self.embedder.generate(query).await;

        let rankable = norm(&query_vector) > 0.0
            && index.uniform_dimension() == Some(query_vector.len())
            && index.entries.iter().all(|e| norm(&e.vector) > 0.0);

        if !rankable {
            warn!(
                "Unrankable vectors in scope {}, returning first {} records in insertion order",
                scope.label(),
                k
            );
            return index
                .entries
                .iter()
                .take(k)
                .map(|e| ScoredDocument {
                    record_id: e.record_id,
                    source: e.source.clone(),
                    text: e.text.clone(),
                    score: None,
                })
                .collect();
        }

        let mut ranked: Vec<(&IndexEntry, f64)> = index
            .entries
            .iter()
            .map(|e| (e, cosine_similarity(&e.vector, &query_vector)))
            .collect();
        // stable sort: ties keep insertion order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let results: Vec<ScoredDocument> = ranked
            .into_iter()
            .take(k)
            .map(|(e, score)| ScoredDocument {
                record_id: e.record_id,
                source: e.source.clone(),
                text: e.text.clone(),
                score: Some(score),
            })
            .collect();

        debug!(
            "Retrieved {} of {} records for '{}' in scope {}",
            results.len(),
            index.len(),
            safe_truncate(query, 50),
            scope.label()
        );
        results
    }

    async fn build_index(&self, scope: &Scope) -> ScopeIndex {
        let records = self.records_for(scope);
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let vector = self.embedder.generate(&record.content).await;
            entries.push(IndexEntry {
                record_id: record.id,
                source: record.filename,
                text: record.content,
                vector,
            });
        }
        info!(
            "Built index for scope {} ({} entries)",
            scope.label(),
            entries.len()
        );
        ScopeIndex::new(scope.clone(), entries)
    }

    /// Scope resolution: an explicit patient scope with no records falls
    /// back to unscoped documents matching that patient's id or registered
    /// name, so documents uploaded without an id still answer targeted
    /// queries. A global scope searches the whole corpus unfiltered.
    fn records_for(&self, scope: &Scope) -> Vec<StoredRecord> {
        match scope {
            Scope::Global => self.store.get_all_records(),
            Scope::Patient(patient_id) => {
                let records = self.store.get_records(patient_id);
                if !records.is_empty() {
                    return records;
                }
                self.identity_fallback(patient_id)
            }
        }
    }

    fn identity_fallback(&self, patient_id: &str) -> Vec<StoredRecord> {
        let mut matches = self.store.search_unscoped(patient_id);

        if let Some(identity) = self.store.get_info(patient_id) {
            if let Some(name) = identity.name {
                for candidate in self.store.search_unscoped(&name) {
                    if matches.iter().all(|r| r.id != candidate.id) {
                        matches.push(candidate);
                    }
                }
            }
        }

        if !matches.is_empty() {
            info!(
                "Identity fallback matched {} unscoped records for patient {}",
                matches.len(),
                patient_id
            );
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryRecordStore, PatientIdentity};

    fn retriever_with(store: Arc<MemoryRecordStore>) -> ContextRetriever {
        let embedder = Arc::new(EmbeddingGenerator::hash_only(64));
        ContextRetriever::new(store, embedder)
    }

    fn record(patient: Option<&str>, filename: &str, content: &str) -> StoredRecord {
        StoredRecord::new(patient.map(String::from), filename, content)
    }

    #[tokio::test]
    async fn test_empty_scope_returns_empty() {
        let store = Arc::new(MemoryRecordStore::new());
        let retriever = retriever_with(store);
        let docs = retriever.retrieve(&Scope::patient("P404"), "anything", 3).await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_bounds_and_no_duplicates() {
        let store = Arc::new(MemoryRecordStore::new());
        for i in 0..5 {
            store.add_record(record(Some("P001"), &format!("r{i}.txt"), &format!("note {i}")));
        }
        let retriever = retriever_with(Arc::clone(&store));

        let docs = retriever.retrieve(&Scope::patient("P001"), "note", 3).await;
        assert_eq!(docs.len(), 3);
        let mut ids: Vec<_> = docs.iter().map(|d| d.record_id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let store = Arc::new(MemoryRecordStore::new());
        for i in 0..4 {
            store.add_record(record(Some("P001"), &format!("r{i}.txt"), &format!("entry {i}")));
        }
        let retriever = retriever_with(Arc::clone(&store));

        let first = retriever.retrieve(&Scope::patient("P001"), "entry", 4).await;
        let second = retriever.retrieve(&Scope::patient("P001"), "entry", 4).await;
        let order1: Vec<_> = first.iter().map(|d| d.record_id).collect();
        let order2: Vec<_> = second.iter().map(|d| d.record_id).collect();
        assert_eq!(order1, order2);
    }

    #[tokio::test]
    async fn test_zero_norm_document_degrades_to_insertion_order() {
        let store = Arc::new(MemoryRecordStore::new());
        store.add_record(record(Some("P001"), "a.txt", "first note"));
        // empty content embeds to the zero vector
        store.add_record(record(Some("P001"), "b.txt", ""));
        store.add_record(record(Some("P001"), "c.txt", "third note"));
        let retriever = retriever_with(Arc::clone(&store));

        let docs = retriever.retrieve(&Scope::patient("P001"), "note", 2).await;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source, "a.txt");
        assert_eq!(docs[1].source, "b.txt");
        assert!(docs.iter().all(|d| d.score.is_none()));
    }

    #[tokio::test]
    async fn test_ranked_results_carry_scores() {
        let store = Arc::new(MemoryRecordStore::new());
        store.add_record(record(Some("P001"), "a.txt", "hypertension follow-up"));
        store.add_record(record(Some("P001"), "b.txt", "dietary advice"));
        let retriever = retriever_with(Arc::clone(&store));

        let docs = retriever.retrieve(&Scope::patient("P001"), "blood pressure", 2).await;
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.score.is_some()));
    }

    #[tokio::test]
    async fn test_identity_fallback_finds_unscoped_records() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut walkin = record(None, "walkin.txt", "Patient seen for migraine. ID: 4471");
        walkin.extracted = Some(crate::extract::extract_patient_info(&walkin.content));
        store.add_record(walkin);
        store.register_patient(PatientIdentity {
            patient_id: "4471".to_string(),
            name: None,
            age: None,
            gender: None,
        });
        let retriever = retriever_with(Arc::clone(&store));

        let docs = retriever.retrieve(&Scope::patient("4471"), "migraine", 3).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "walkin.txt");
    }

    #[tokio::test]
    async fn test_name_matched_upload_reaches_queried_empty_scope() {
        let store = Arc::new(MemoryRecordStore::new());
        store.register_patient(PatientIdentity {
            patient_id: "P010".to_string(),
            name: Some("Maria Santos".to_string()),
            age: None,
            gender: None,
        });
        let retriever = retriever_with(Arc::clone(&store));

        let scope = Scope::patient("P010");
        assert!(retriever.retrieve(&scope, "migraine", 3).await.is_empty());

        // upload carries the registered name but no patient id, so only
        // the global scope gets invalidated
        store.add_record(record(None, "walkin.txt", "Maria Santos seen for migraine"));
        retriever.invalidate(&Scope::Global);

        let docs = retriever.retrieve(&scope, "migraine", 3).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "walkin.txt");
    }

    #[tokio::test]
    async fn test_invalidate_makes_new_record_visible() {
        let store = Arc::new(MemoryRecordStore::new());
        store.add_record(record(Some("P001"), "a.txt", "initial visit"));
        let retriever = retriever_with(Arc::clone(&store));

        let scope = Scope::patient("P001");
        assert_eq!(retriever.retrieve(&scope, "visit", 5).await.len(), 1);

        store.add_record(record(Some("P001"), "b.txt", "follow-up visit"));
        // stale until invalidated
        assert_eq!(retriever.retrieve(&scope, "visit", 5).await.len(), 1);

        retriever.invalidate(&scope);
        assert_eq!(retriever.retrieve(&scope, "visit", 5).await.len(), 2);
    }

    #[tokio::test]
    async fn test_global_scope_covers_whole_corpus() {
        let store = Arc::new(MemoryRecordStore::new());
        store.add_record(record(Some("P001"), "a.txt", "scoped note"));
        store.add_record(record(None, "b.txt", "unscoped note"));
        let retriever = retriever_with(Arc::clone(&store));

        let docs = retriever.retrieve(&Scope::Global, "note", 10).await;
        assert_eq!(docs.len(), 2);
    }
}
