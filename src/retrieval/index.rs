use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::store::Scope;

/// One indexed document: record text plus its embedding at index time.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub record_id: Uuid,
    pub source: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// Vector index for a single scope. Entries keep insertion order; that
/// order is the tie-breaker and the degraded ranking.
#[derive(Debug)]
pub struct ScopeIndex {
    pub scope: Scope,
    pub entries: Vec<IndexEntry>,
}

impl ScopeIndex {
    pub fn new(scope: Scope, entries: Vec<IndexEntry>) -> Self {
        Self { scope, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Dimension shared by all entries, or `None` when entries disagree
    /// (mixed dimensions make cosine ranking invalid for this index).
    pub fn uniform_dimension(&self) -> Option<usize> {
        let mut dims = self.entries.iter().map(|e| e.vector.len());
        let first = dims.next()?;
        if dims.all(|d| d == first) { Some(first) } else { None }
    }
}

/// Process-lifetime cache of built scope indexes. A missing entry means
/// UNLOADED; the synchronous build in the retriever is the LOADING phase;
/// presence means READY. Racing first-builds of the same scope are
/// idempotent and resolve last-writer-wins; a reader only ever observes a
/// fully built index or none.
pub struct IndexCache {
    inner: RwLock<HashMap<Scope, Arc<ScopeIndex>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, scope: &Scope) -> Option<Arc<ScopeIndex>> {
        self.inner.read().get(scope).cloned()
    }

    pub fn insert(&self, index: Arc<ScopeIndex>) {
        self.inner.write().insert(index.scope.clone(), index);
    }

    /// Drop the cached index for one scope; the next query rebuilds it.
    pub fn invalidate(&self, scope: &Scope) {
        if self.inner.write().remove(scope).is_some() {
            debug!("Index invalidated for scope {}", scope.label());
        }
    }

    pub fn invalidate_all(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}
