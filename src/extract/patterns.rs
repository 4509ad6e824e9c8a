use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref NAME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?:Patient\s+)?[Nn]ame:\s*([A-Za-z][A-Za-z\s]*?)(?:\s+(?:Age|Gender|Sex|ID|Date|DOB)\b|,|\n|$)")
            .unwrap(),
        Regex::new(r"[Pp]atient:\s*([A-Za-z][A-Za-z\s]*?)(?:\s+(?:Age|Gender|Sex|ID)\b|,|\n|$)")
            .unwrap(),
    ];

    /// Trailing field labels that leak into a captured name.
    pub static ref NAME_TRAILING_LABELS: Regex =
        Regex::new(r"\s*(?:Patient|ID|Age|Gender|Sex|Date|DOB)\b.*").unwrap();

    pub static ref AGE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bage\s*:\s*(\d{1,3})").unwrap(),
        Regex::new(r"(?i)\b(\d{1,3})\s*(?:years?\s*old|y/?o|yrs?\b)").unwrap(),
    ];

    pub static ref GENDER_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bgender\s*:\s*([MF](?:ale|emale)?)\b").unwrap(),
        Regex::new(r"(?i)\bsex\s*:\s*([MF](?:ale|emale)?)\b").unwrap(),
    ];

    pub static ref PATIENT_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:patient\s+)?\bid\s*:\s*([A-Za-z0-9\-]+)").unwrap(),
        Regex::new(r"(?i)\bp(?:atient)?\s*:?\s*([0-9]{3,})").unwrap(),
    ];

    pub static ref HOSPITAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bhospital\s*:\s*([A-Za-z][A-Za-z\s]*?)(?:,|\n|$)").unwrap(),
        Regex::new(r"(?i)\bfacility\s*:\s*([A-Za-z][A-Za-z\s]*?)(?:\n|$)").unwrap(),
    ];

    pub static ref DIAGNOSIS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bdiagnosis\s*:\s*([^:\n]+?)(?:\n|$)").unwrap(),
        Regex::new(r"(?i)\bchief\s+complaint\s*:\s*([^:\n]+?)(?:\n|$)").unwrap(),
    ];
}

/// Run an ordered pattern list, returning the first capture that passes the
/// caller's validation.
pub fn first_match<F>(patterns: &[Regex], text: &str, accept: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for pattern in patterns {
        if let Some(captures) = pattern.captures(text) {
            if let Some(value) = captures.get(1) {
                if let Some(accepted) = accept(value.as_str().trim()) {
                    return Some(accepted);
                }
            }
        }
    }
    None
}
