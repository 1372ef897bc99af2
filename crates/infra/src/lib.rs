//! Infrastructure layer: document persistence for user accounts and
//! inventory items.
//!
//! Handlers only ever see the [`store::DocumentStore`] port. Two adapters
//! implement it: an in-memory one (tests, local dev) and a Postgres one that
//! keeps each collection as a JSONB table.

pub mod documents;
pub mod store;

pub use store::{
    Document, DocumentStore, Filter, FindOptions, InMemoryDocumentStore, Page, PostgresDocumentStore, Sort,
    SortOrder, StoreError, Stored,
};
