pub mod memory;

pub use memory::MemoryRecordStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::PatientInfo;

/// Retrieval partition: one patient, or the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Patient(String),
    Global,
}

impl Scope {
    pub fn patient(id: impl Into<String>) -> Self {
        Self::Patient(id.into())
    }

    pub fn label(&self) -> String {
        match self {
            Self::Patient(id) => id.clone(),
            Self::Global => "global".to_string(),
        }
    }
}

/// Immutable unit of retrievable text. `extracted` is only populated for
/// records ingested without an explicit patient id; it is best-effort
/// searchability metadata, never authoritative identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub patient_id: Option<String>,
    pub filename: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub extracted: Option<PatientInfo>,
}

impl StoredRecord {
    pub fn new(patient_id: Option<String>, filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            filename: filename.into(),
            content: content.into(),
            timestamp: Utc::now(),
            extracted: None,
        }
    }
}

/// Registered identity for a known patient id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub patient_id: String,
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
}

/// Narrow read/write contract over the persistent record store. The
/// production store lives behind this seam; the retrieval core never sees
/// its schema.
pub trait RecordStore: Send + Sync {
    /// All records filed under an explicit patient id, in insertion order.
    fn get_records(&self, patient_id: &str) -> Vec<StoredRecord>;

    /// Registered identity for a patient id, if any.
    fn get_info(&self, patient_id: &str) -> Option<PatientIdentity>;

    /// Unscoped records whose content or extracted identity matches the
    /// query substring (case-insensitive).
    fn search_unscoped(&self, query: &str) -> Vec<StoredRecord>;

    /// The entire corpus (patient records plus unscoped documents).
    fn get_all_records(&self) -> Vec<StoredRecord>;

    fn add_record(&self, record: StoredRecord);
}
