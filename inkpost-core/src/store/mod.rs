//! Document store contract
//!
//! The blog keeps all of its data in a managed document database. This module
//! describes the slice of that database the application relies on: keyed
//! collections of opaque JSON documents with create/read/update/delete and an
//! ordered query.
//!
//! - Trait-based storage so the hosted backend and [`MemoryDocumentStore`]
//!   are interchangeable
//! - Documents are plain `serde_json` maps; record types live in [`crate::blog`]

mod memory;

pub use memory::MemoryDocumentStore;

use crate::error::StoreResult;
use serde_json::Value;
use std::cmp::Ordering;

/// Document body - flexible key-value record
pub type Document = serde_json::Map<String, Value>;

/// Collection names used by the blog
pub struct Collection;

impl Collection {
    pub const USERS: &'static str = "users";
    pub const CATEGORIES: &'static str = "categories";
    pub const POSTS: &'static str = "posts";
}

/// A document together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Sort direction for [`OrderBy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Ordering clause of a [`Query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Collection query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Query returning every document in store order
    pub fn all() -> Self {
        Self::default()
    }

    /// Order ascending by a field
    pub fn order_by(field: impl Into<String>) -> Self {
        Self {
            order_by: Some(OrderBy { field: field.into(), direction: Direction::Ascending }),
            limit: None,
        }
    }

    /// Order descending by a field
    pub fn order_by_desc(field: impl Into<String>) -> Self {
        Self {
            order_by: Some(OrderBy { field: field.into(), direction: Direction::Descending }),
            limit: None,
        }
    }

    /// Cap the number of returned documents
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply ordering and limit to a result set
    pub fn apply(&self, mut docs: Vec<StoredDocument>) -> Vec<StoredDocument> {
        if let Some(order) = &self.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_field(a.data.get(&order.field), b.data.get(&order.field));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

/// Missing fields sort first, numbers numerically, strings lexically.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Document storage trait
///
/// Implement this trait to plug in a hosted document database.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a generated id, returning the id
    async fn create(&self, collection: &str, data: Document) -> StoreResult<String>;

    /// Read a document by id
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Write a document, replacing any existing content
    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()>;

    /// Merge fields into an existing document
    ///
    /// Fails with `NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Query a collection
    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<StoredDocument>>;
}

#[async_trait::async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn create(&self, collection: &str, data: Document) -> StoreResult<String> {
        (**self).create(collection, data).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        (**self).get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        (**self).set(collection, id, data).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        (**self).update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id).await
    }

    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<StoredDocument>> {
        (**self).query(collection, query).await
    }
}

/// Serialize a record into a document body
pub fn to_document<T: serde::Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Document::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

/// Deserialize a document body into a record
pub fn from_document<T: serde::de::DeserializeOwned>(data: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(data))?)
}
