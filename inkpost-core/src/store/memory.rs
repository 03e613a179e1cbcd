//! In-memory document storage
//!
//! Thread-safe `RwLock<HashMap>` backend. Used for tests, the CLI and local
//! development; data is lost when the process exits.

use super::{Document, DocumentStore, Query, StoredDocument};
use crate::error::{StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

type Collections = HashMap<String, HashMap<String, Document>>;

/// In-memory document store
///
/// # Example
///
/// ```
/// use inkpost_core::store::MemoryDocumentStore;
///
/// let store = MemoryDocumentStore::new();
/// ```
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .expect("document store lock poisoned")
            .get(collection)
            .map_or(0, HashMap::len)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, data: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let mut collections = self.collections.write().expect("document store lock poisoned");
        collections.entry(collection.to_string()).or_default().insert(id.clone(), data);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().expect("document store lock poisoned");
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().expect("document store lock poisoned");
        collections.entry(collection.to_string()).or_default().insert(id.to_string(), data);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().expect("document store lock poisoned");
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        for (key, value) in fields {
            existing.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().expect("document store lock poisoned");
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<StoredDocument>> {
        let docs: Vec<StoredDocument> = {
            let collections = self.collections.read().expect("document store lock poisoned");
            collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, data)| StoredDocument { id: id.clone(), data: data.clone() })
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(query.apply(docs))
    }
}
