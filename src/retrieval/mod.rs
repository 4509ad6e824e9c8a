pub mod index;
pub mod retriever;
pub mod similarity;

pub use index::{IndexCache, IndexEntry, ScopeIndex};
pub use retriever::{ContextRetriever, ScoredDocument};
pub use similarity::cosine_similarity;
