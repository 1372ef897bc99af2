//! Collection-oriented persistence port.
//!
//! A [`Document`] is a serde-serializable record stored under a generated
//! identifier in a named collection. The [`DocumentStore`] trait is the only
//! storage surface the API layer depends on; adapters live in the
//! submodules.

pub mod in_memory;
pub mod postgres;
pub mod query;

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

pub use in_memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{Filter, FindOptions, Page, Sort, SortOrder};

/// A record type that can be persisted in a [`DocumentStore`].
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Debug + Display + Serialize + From<Uuid> + Into<Uuid> + Send + Sync + 'static;

    /// Collection (table) name.
    const COLLECTION: &'static str;

    /// Top-level fields whose values must be unique across the collection.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];
}

/// A persisted document together with its identifier.
///
/// Serializes as the document's own fields plus `_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<D: Document> {
    pub id: D::Id,
    pub document: D,
}

impl<D: Document> Stored<D> {
    pub fn new(id: D::Id, document: D) -> Self {
        Self { id, document }
    }
}

impl<D: Document> Serialize for Stored<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a, I, T> {
            #[serde(rename = "_id")]
            id: &'a I,
            #[serde(flatten)]
            document: &'a T,
        }

        Wire {
            id: &self.id,
            document: &self.document,
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique field already holds the submitted value.
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(String),

    #[error("stored document could not be (de)serialized: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}

/// Async persistence port for one collection.
#[async_trait::async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    /// First document (in insertion order) matching `filter`.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Stored<D>>, StoreError>;

    async fn find(&self, options: &FindOptions) -> Result<Vec<Stored<D>>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn get(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError>;

    async fn insert_one(&self, document: D) -> Result<Stored<D>, StoreError>;

    /// Insert all documents or none of them.
    async fn insert_many(&self, documents: Vec<D>) -> Result<Vec<Stored<D>>, StoreError>;

    /// Replace the document stored under `id`. `Ok(None)` when absent.
    async fn update_by_id(&self, id: D::Id, document: D) -> Result<Option<Stored<D>>, StoreError>;

    /// Remove and return the document stored under `id`. `Ok(None)` when absent.
    async fn delete_by_id(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError>;
}

#[async_trait::async_trait]
impl<D, S> DocumentStore<D> for Arc<S>
where
    D: Document,
    S: DocumentStore<D> + ?Sized,
{
    async fn find_one(&self, filter: &Filter) -> Result<Option<Stored<D>>, StoreError> {
        (**self).find_one(filter).await
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<Stored<D>>, StoreError> {
        (**self).find(options).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        (**self).count(filter).await
    }

    async fn get(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError> {
        (**self).get(id).await
    }

    async fn insert_one(&self, document: D) -> Result<Stored<D>, StoreError> {
        (**self).insert_one(document).await
    }

    async fn insert_many(&self, documents: Vec<D>) -> Result<Vec<Stored<D>>, StoreError> {
        (**self).insert_many(documents).await
    }

    async fn update_by_id(&self, id: D::Id, document: D) -> Result<Option<Stored<D>>, StoreError> {
        (**self).update_by_id(id, document).await
    }

    async fn delete_by_id(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError> {
        (**self).delete_by_id(id).await
    }
}

/// Fresh identifier for a document about to be inserted.
pub(crate) fn new_id<D: Document>() -> D::Id {
    D::Id::from(Uuid::now_v7())
}

pub(crate) fn to_json<D: Document>(document: &D) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(document).map_err(|e| StoreError::Serialization(e.to_string()))
}
