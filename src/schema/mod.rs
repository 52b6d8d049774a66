//! Graph schema extraction, rendering and the per-session schema holder

pub mod extractor;
pub mod models;
pub mod render;

pub use extractor::extract;
pub use models::*;
pub use render::render;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds the current schema of a session.
///
/// Readers take an `Arc` snapshot; refresh swaps in a whole new descriptor,
/// so a reader never observes a partially updated schema.
#[derive(Debug, Default)]
pub struct SchemaHandle {
    current: RwLock<Arc<SchemaDescriptor>>,
}

impl SchemaHandle {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self {
            current: RwLock::new(Arc::new(schema)),
        }
    }

    /// The descriptor as of now. Later swaps do not affect the returned value.
    pub async fn snapshot(&self) -> Arc<SchemaDescriptor> {
        self.current.read().await.clone()
    }

    /// Replace the descriptor atomically.
    pub async fn replace(&self, schema: SchemaDescriptor) {
        *self.current.write().await = Arc::new(schema);
    }

    /// Rendered grounding text of the current snapshot.
    pub async fn rendered(&self) -> String {
        let schema = self.snapshot().await;
        render(&schema)
    }
}
