use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::{PatientIdentity, RecordStore, StoredRecord};
use crate::utils::clean_text;

/// In-process record store used by the console binary and tests. Keeps
/// records in insertion order; retrieval determinism relies on that.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<StoredRecord>>,
    patients: RwLock<HashMap<String, PatientIdentity>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register identity details for a patient id, so unscoped documents
    /// can later be matched by name.
    pub fn register_patient(&self, identity: PatientIdentity) {
        self.patients
            .write()
            .insert(identity.patient_id.clone(), identity);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn record_matches(record: &StoredRecord, needle: &str) -> bool {
    if clean_text(&record.content).contains(needle) {
        return true;
    }
    if let Some(info) = &record.extracted {
        for field in [&info.name, &info.patient_id, &info.hospital, &info.diagnosis] {
            if let Some(value) = field {
                if clean_text(value).contains(needle) {
                    return true;
                }
            }
        }
    }
    false
}

impl RecordStore for MemoryRecordStore {
    fn get_records(&self, patient_id: &str) -> Vec<StoredRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.patient_id.as_deref() == Some(patient_id))
            .cloned()
            .collect()
    }

    fn get_info(&self, patient_id: &str) -> Option<PatientIdentity> {
        self.patients.read().get(patient_id).cloned()
    }

    fn search_unscoped(&self, query: &str) -> Vec<StoredRecord> {
        let needle = clean_text(query);
        if needle.is_empty() {
            return Vec::new();
        }
        self.records
            .read()
            .iter()
            .filter(|r| r.patient_id.is_none() && record_matches(r, &needle))
            .cloned()
            .collect()
    }

    fn get_all_records(&self) -> Vec<StoredRecord> {
        self.records.read().clone()
    }

    fn add_record(&self, record: StoredRecord) {
        debug!(
            "Storing record {} (patient={})",
            record.id,
            record.patient_id.as_deref().unwrap_or("-")
        );
        self.records.write().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PatientInfo;

    #[test]
    fn test_get_records_filters_by_patient() {
        let store = MemoryRecordStore::new();
        store.add_record(StoredRecord::new(Some("P001".into()), "a.txt", "fever"));
        store.add_record(StoredRecord::new(Some("P002".into()), "b.txt", "cough"));
        store.add_record(StoredRecord::new(None, "c.txt", "unfiled note"));

        let records = store.get_records("P001");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "a.txt");
        assert_eq!(store.get_all_records().len(), 3);
    }

    #[test]
    fn test_search_unscoped_matches_content_and_identity() {
        let store = MemoryRecordStore::new();
        let mut record = StoredRecord::new(None, "walkin.txt", "Presented with chest pain");
        record.extracted = Some(PatientInfo {
            name: Some("Jane Q Public".into()),
            ..Default::default()
        });
        store.add_record(record);
        store.add_record(StoredRecord::new(Some("P001".into()), "a.txt", "chest pain"));

        // scoped records never surface through the unscoped search
        assert_eq!(store.search_unscoped("chest pain").len(), 1);
        assert_eq!(store.search_unscoped("jane q public").len(), 1);
        assert!(store.search_unscoped("appendicitis").is_empty());
    }
}
