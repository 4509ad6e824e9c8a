pub mod engine;
pub mod local;
pub mod prompt;

pub use engine::{Answer, AnswerEngine, AnswerSource, GenerationOutcome};
pub use local::NO_EVIDENCE_REPLY;
