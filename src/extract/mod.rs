//! Heuristic identity extraction from free-text clinical documents.
//!
//! Used at ingestion time for records uploaded without a patient id, so they
//! stay findable by name/id search later. Best-effort metadata only: never
//! an input to access control or record linkage.

pub mod patterns;

use serde::{Deserialize, Serialize};

use patterns::{
    AGE_PATTERNS, DIAGNOSIS_PATTERNS, GENDER_PATTERNS, HOSPITAL_PATTERNS, NAME_PATTERNS,
    NAME_TRAILING_LABELS, PATIENT_ID_PATTERNS, first_match,
};

/// Identity fields recovered from document text. Every field is
/// independently optional; a rejected capture is left absent, never guessed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub patient_id: Option<String>,
    pub hospital: Option<String>,
    pub diagnosis: Option<String>,
}

impl PatientInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.patient_id.is_none()
            && self.hospital.is_none()
            && self.diagnosis.is_none()
    }
}

/// At least first and last name after stripping trailing field labels.
pub fn extract_name(text: &str) -> Option<String> {
    first_match(&NAME_PATTERNS, text, |raw| {
        let name = NAME_TRAILING_LABELS.replace(raw, "").trim().to_string();
        if name.split_whitespace().count() >= 2 {
            Some(name)
        } else {
            None
        }
    })
}

/// Integer strictly between 0 and 150.
pub fn extract_age(text: &str) -> Option<String> {
    first_match(&AGE_PATTERNS, text, |raw| {
        let age: u32 = raw.parse().ok()?;
        if age > 0 && age < 150 {
            Some(age.to_string())
        } else {
            None
        }
    })
}

/// Leading 'm'/'f' maps to a canonical label; anything else is rejected.
pub fn extract_gender(text: &str) -> Option<String> {
    first_match(&GENDER_PATTERNS, text, |raw| {
        match raw.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('m') => Some("Male".to_string()),
            Some('f') => Some("Female".to_string()),
            _ => None,
        }
    })
}

pub fn extract_patient_id(text: &str) -> Option<String> {
    first_match(&PATIENT_ID_PATTERNS, text, |raw| {
        if raw.len() >= 2 {
            Some(raw.to_string())
        } else {
            None
        }
    })
}

pub fn extract_hospital(text: &str) -> Option<String> {
    first_match(&HOSPITAL_PATTERNS, text, |raw| {
        if raw.len() > 3 && raw.len() < 100 {
            Some(raw.to_string())
        } else {
            None
        }
    })
}

pub fn extract_diagnosis(text: &str) -> Option<String> {
    first_match(&DIAGNOSIS_PATTERNS, text, |raw| {
        if raw.len() > 5 && raw.len() < 200 {
            Some(raw.to_string())
        } else {
            None
        }
    })
}

/// Run the full cascade. Each field is tried independently; there is no
/// shared state between attempts.
pub fn extract_patient_info(text: &str) -> PatientInfo {
    PatientInfo {
        name: extract_name(text),
        age: extract_age(text),
        gender: extract_gender(text),
        patient_id: extract_patient_id(text),
        hospital: extract_hospital(text),
        diagnosis: extract_diagnosis(text),
    }
}

/// Human-readable label for an extracted identity, e.g. "Jane Q Public (45F)".
pub fn display_name(info: &PatientInfo) -> String {
    let mut parts = Vec::new();
    if let Some(name) = &info.name {
        parts.push(name.clone());
    }
    match (&info.age, &info.gender) {
        (Some(age), Some(gender)) => {
            let initial = gender.chars().next().unwrap_or('?');
            parts.push(format!("({age}{initial})"));
        }
        (Some(age), None) => parts.push(format!("(Age {age})")),
        _ => {}
    }
    if parts.is_empty() {
        "Unnamed Patient".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_labeled_header_line() {
        let info = extract_patient_info("Name: Jane Q Public Age: 45 Gender: F ID: 4471");
        assert_eq!(info.name.as_deref(), Some("Jane Q Public"));
        assert_eq!(info.age.as_deref(), Some("45"));
        assert_eq!(info.gender.as_deref(), Some("Female"));
        assert_eq!(info.patient_id.as_deref(), Some("4471"));
    }

    #[test]
    fn test_implausible_age_left_absent() {
        let info = extract_patient_info("Name: John Redwood Smith Age: 200 Gender: M");
        assert_eq!(info.age, None);
        assert_eq!(info.name.as_deref(), Some("John Redwood Smith"));
    }

    #[test]
    fn test_age_zero_rejected() {
        assert_eq!(extract_age("Age: 0"), None);
        assert_eq!(extract_age("Age: 149"), Some("149".to_string()));
    }

    #[test]
    fn test_single_token_name_rejected() {
        assert_eq!(extract_name("Name: Jane"), None);
    }

    #[test]
    fn test_gender_unknown_value_never_guessed() {
        assert_eq!(extract_gender("Gender: X"), None);
        assert_eq!(extract_gender("Sex: male"), Some("Male".to_string()));
        assert_eq!(extract_gender("Gender: Female"), Some("Female".to_string()));
    }

    #[test]
    fn test_patient_id_forms() {
        assert_eq!(
            extract_patient_id("Patient ID: AB-1021"),
            Some("AB-1021".to_string())
        );
        assert_eq!(extract_patient_id("P: 4471"), Some("4471".to_string()));
        // numeric shorthand needs at least three digits
        assert_eq!(extract_patient_id("P: 44"), None);
    }

    #[test]
    fn test_diagnosis_length_band() {
        assert_eq!(
            extract_diagnosis("DIAGNOSIS: Type 2 Diabetes\n"),
            Some("Type 2 Diabetes".to_string())
        );
        assert_eq!(extract_diagnosis("Diagnosis: flu\n"), None);
    }

    #[test]
    fn test_hospital_line() {
        assert_eq!(
            extract_hospital("Hospital: City General\nWard: 4"),
            Some("City General".to_string())
        );
    }

    #[test]
    fn test_display_name_variants() {
        let info = extract_patient_info("Name: Jane Q Public Age: 45 Gender: F ID: 4471");
        assert_eq!(display_name(&info), "Jane Q Public (45F)");
        assert_eq!(display_name(&PatientInfo::default()), "Unnamed Patient");

        let age_only = PatientInfo {
            age: Some("62".to_string()),
            ..Default::default()
        };
        assert_eq!(display_name(&age_only), "(Age 62)");
    }

    #[test]
    fn test_empty_text_yields_empty_info() {
        assert!(extract_patient_info("").is_empty());
    }
}
