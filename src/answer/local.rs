//! Deterministic local answer strategy: templating over composed evidence.
//! This is the pipeline's backstop and must never fail.

use crate::compose::ComposedContext;

/// Fixed reply when no relevant records exist anywhere.
pub const NO_EVIDENCE_REPLY: &str = "I don't know based on the available patient records. \
Please consult a clinician for further guidance.";

pub const EVIDENCE_HEADING: &str = "### Answer based on internal patient records:";

/// Render composed evidence as a numbered, labeled digest. Identical input
/// always renders identical output.
pub fn render(context: &ComposedContext) -> String {
    if context.is_empty() {
        return NO_EVIDENCE_REPLY.to_string();
    }

    let mut lines = vec![EVIDENCE_HEADING.to_string(), String::new()];
    for excerpt in &context.excerpts {
        lines.push(format!(
            "**Record {} ({})**: {}",
            excerpt.rank,
            excerpt.source,
            excerpt.text.replace('\n', " ")
        ));
        for (label, body) in excerpt.sections.labeled() {
            lines.push(format!("  - {label}: {body}"));
        }
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::EvidenceComposer;
    use crate::retrieval::ScoredDocument;
    use uuid::Uuid;

    fn doc(text: &str) -> ScoredDocument {
        ScoredDocument {
            record_id: Uuid::new_v4(),
            source: "chart.txt".to_string(),
            text: text.to_string(),
            score: None,
        }
    }

    #[test]
    fn test_no_evidence_is_fixed_reply() {
        assert_eq!(render(&ComposedContext::default()), NO_EVIDENCE_REPLY);
    }

    #[test]
    fn test_render_is_deterministic() {
        let context = EvidenceComposer::new(600)
            .compose(&[doc("DIAGNOSIS: Type 2 Diabetes"), doc("MEDICATIONS: metformin")]);
        assert_eq!(render(&context), render(&context));
    }

    #[test]
    fn test_render_numbers_records_and_labels_sections() {
        let context = EvidenceComposer::new(600).compose(&[doc("DIAGNOSIS: Type 2 Diabetes")]);
        let reply = render(&context);
        assert!(reply.starts_with(EVIDENCE_HEADING));
        assert!(reply.contains("**Record 1 (chart.txt)**"));
        assert!(reply.contains("- Diagnosis: Type 2 Diabetes"));
    }
}
