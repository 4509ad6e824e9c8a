use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::safe_truncate;

/// Named clinical sections pulled out of an excerpt. Absent anchor means
/// absent section; there are no placeholder values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalSections {
    pub patient_info: Option<String>,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub medications: Option<String>,
    pub test_results: Option<String>,
    pub assessment: Option<String>,
}

impl ClinicalSections {
    pub fn is_empty(&self) -> bool {
        self.labeled().is_empty()
    }

    /// Present sections with display labels, in clinical reading order.
    pub fn labeled(&self) -> Vec<(&'static str, &str)> {
        [
            ("Patient Info", &self.patient_info),
            ("Chief Complaint", &self.chief_complaint),
            ("Diagnosis", &self.diagnosis),
            ("Medications", &self.medications),
            ("Test Results", &self.test_results),
            ("Assessment", &self.assessment),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .collect()
    }
}

lazy_static! {
    static ref SECTION_ANCHORS: Vec<(usize, Regex)> = vec![
        (0, Regex::new(r"(?i)patient\s+info(?:rmation)?\s*:?").unwrap()),
        (1, Regex::new(r"(?i)chief\s+complaint\s*:?").unwrap()),
        (2, Regex::new(r"(?i)diagnosis\s*:?").unwrap()),
        (3, Regex::new(r"(?i)medications?\s*:?").unwrap()),
        (4, Regex::new(r"(?i)test\s+results?\s*:?").unwrap()),
        (5, Regex::new(r"(?i)assessment\s*:?").unwrap()),
    ];
}

/// Locate each anchor phrase and capture a bounded window of following
/// text, stopping early at the next anchor. Malformed input yields empty
/// sections, never an error.
pub fn extract_sections(text: &str, window_chars: usize) -> ClinicalSections {
    let mut spans: Vec<(usize, usize, usize)> = Vec::new(); // (field, start, body_start)
    for (field, anchor) in SECTION_ANCHORS.iter() {
        if let Some(m) = anchor.find(text) {
            spans.push((*field, m.start(), m.end()));
        }
    }
    spans.sort_by_key(|&(_, start, _)| start);

    let mut sections = ClinicalSections::default();
    for (i, &(field, _, body_start)) in spans.iter().enumerate() {
        let body_end = spans
            .get(i + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(text.len());
        let body = safe_truncate(text[body_start..body_end].trim(), window_chars);
        let body = body.trim().to_string();
        if body.is_empty() {
            continue;
        }
        let slot = match field {
            0 => &mut sections.patient_info,
            1 => &mut sections.chief_complaint,
            2 => &mut sections.diagnosis,
            3 => &mut sections.medications,
            4 => &mut sections.test_results,
            _ => &mut sections.assessment,
        };
        *slot = Some(body);
    }
    sections
}
