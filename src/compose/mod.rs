//! Evidence composition: turns ranked raw record text into clean, bounded
//! excerpts for display and for LLM prompt assembly.

pub mod sections;

pub use sections::{ClinicalSections, extract_sections};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::retrieval::ScoredDocument;

/// One cleaned excerpt. `rank` is 1-based and mirrors retrieval order,
/// the only relevance signal carried forward to the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Excerpt {
    pub rank: usize,
    pub source: String,
    pub text: String,
    pub sections: ClinicalSections,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposedContext {
    pub excerpts: Vec<Excerpt>,
}

impl ComposedContext {
    pub fn is_empty(&self) -> bool {
        self.excerpts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.excerpts.len()
    }
}

lazy_static! {
    /// Decorative separator runs, e.g. "====...=" banners in dumped charts.
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[=\-]{40,}").unwrap();
}

/// Stateless composer; construct one per character budget.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceComposer {
    excerpt_chars: usize,
    section_window_chars: usize,
}

impl EvidenceComposer {
    pub fn new(excerpt_chars: usize) -> Self {
        Self {
            excerpt_chars,
            section_window_chars: 200,
        }
    }

    /// Compose ranked documents into bounded excerpts. Never fails: the
    /// worst case for malformed input is truncated raw text with no
    /// extracted sections. Output order matches input rank order.
    pub fn compose(&self, documents: &[ScoredDocument]) -> ComposedContext {
        let excerpts = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let cleaned = clean_document(&doc.text);
                let text = truncate_at_whitespace(&cleaned, self.excerpt_chars);
                let sections = extract_sections(&cleaned, self.section_window_chars);
                Excerpt {
                    rank: i + 1,
                    source: doc.source.clone(),
                    text,
                    sections,
                }
            })
            .collect();
        ComposedContext { excerpts }
    }
}

/// Strip separator runs and collapse each logical line to single-spaced,
/// non-blank form.
fn clean_document(text: &str) -> String {
    let stripped = SEPARATOR_RUN.replace_all(text, " ");
    stripped
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate to at most `budget` characters, cutting at the last whitespace
/// boundary before the limit and appending an ellipsis. A single token
/// longer than the budget is the one case that gets a hard cut.
fn truncate_at_whitespace(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let head: String = text.chars().take(budget.saturating_sub(3)).collect();
    let cut = match head.rfind(char::is_whitespace) {
        Some(pos) => head[..pos].trim_end().to_string(),
        None => head,
    };
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn doc(text: &str) -> ScoredDocument {
        ScoredDocument {
            record_id: Uuid::new_v4(),
            source: "chart.txt".to_string(),
            text: text.to_string(),
            score: Some(0.9),
        }
    }

    #[test]
    fn test_excerpt_never_exceeds_budget() {
        let composer = EvidenceComposer::new(100);
        let words = "word ".repeat(200);
        let context = composer.compose(&[doc(&words)]);
        assert!(context.excerpts[0].text.chars().count() <= 100);
        assert!(context.excerpts[0].text.ends_with("..."));
    }

    #[test]
    fn test_cut_is_whitespace_aligned() {
        let composer = EvidenceComposer::new(50);
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo";
        let context = composer.compose(&[doc(text)]);
        let excerpt = context.excerpts[0].text.trim_end_matches("...");
        // every emitted word must be a whole input word
        for word in excerpt.split_whitespace() {
            assert!(text.split_whitespace().any(|w| w == word), "cut word: {word}");
        }
    }

    #[test]
    fn test_short_text_is_untouched() {
        let composer = EvidenceComposer::new(600);
        let context = composer.compose(&[doc("BP 120/80, stable")]);
        assert_eq!(context.excerpts[0].text, "BP 120/80, stable");
    }

    #[test]
    fn test_separator_runs_are_stripped() {
        let composer = EvidenceComposer::new(600);
        let text = format!("header\n{}\nDIAGNOSIS: asthma", "=".repeat(60));
        let context = composer.compose(&[doc(&text)]);
        assert!(!context.excerpts[0].text.contains('='));
        assert_eq!(
            context.excerpts[0].sections.diagnosis.as_deref(),
            Some("asthma")
        );
    }

    #[test]
    fn test_short_dashes_survive() {
        let composer = EvidenceComposer::new(600);
        let context = composer.compose(&[doc("BP 120/80 --- recheck")]);
        assert!(context.excerpts[0].text.contains("---"));
    }

    #[test]
    fn test_rank_follows_input_order() {
        let composer = EvidenceComposer::new(600);
        let context = composer.compose(&[doc("first"), doc("second")]);
        assert_eq!(context.excerpts[0].rank, 1);
        assert_eq!(context.excerpts[1].rank, 2);
        assert_eq!(context.excerpts[0].text, "first");
    }

    #[test]
    fn test_giant_token_gets_hard_cut() {
        let composer = EvidenceComposer::new(20);
        let context = composer.compose(&[doc(&"x".repeat(100))]);
        assert!(context.excerpts[0].text.chars().count() <= 20);
    }

    #[test]
    fn test_empty_input_composes_empty() {
        let composer = EvidenceComposer::new(600);
        assert!(composer.compose(&[]).is_empty());
    }
}
