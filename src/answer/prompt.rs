//! The two mutually exclusive prompt templates. Selection is driven solely
//! by evidence presence; a single call never mixes them.

use crate::compose::ComposedContext;

pub const EVIDENCE_SYSTEM_PROMPT: &str = "\
You are a clinical assistant answering a clinician's question about a patient. \
Answer ONLY from the numbered record excerpts supplied by the user. \
Cite the excerpt numbers you used, like [1] or [2]. \
Do not invent findings that are not in the excerpts. \
If the excerpts do not contain the answer, reply exactly: I don't know.";

pub const GENERAL_SYSTEM_PROMPT: &str = "\
You are a clinical assistant. No relevant patient records were found for this \
question, so answer from general medical knowledge. Begin your reply with: \
\"No matching patient records were found; the following is general medical \
information.\" Keep the answer concise and end by recommending the clinician \
confirm with the treating provider.";

/// User prompt for the evidence-grounded template.
pub fn evidence_prompt(question: &str, context: &ComposedContext) -> String {
    let mut prompt = String::from("Record excerpts:\n\n");
    for excerpt in &context.excerpts {
        prompt.push_str(&format!(
            "[{}] ({})\n{}\n",
            excerpt.rank, excerpt.source, excerpt.text
        ));
        for (label, body) in excerpt.sections.labeled() {
            prompt.push_str(&format!("    {label}: {body}\n"));
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!("Question: {question}"));
    prompt
}

/// User prompt for the general-knowledge template.
pub fn general_prompt(question: &str) -> String {
    format!("Question: {question}")
}
