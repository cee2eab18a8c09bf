//! Primary store and search index backends for intake documents.

pub mod error;
pub mod postgres;
pub mod search;
pub mod store;

pub use error::StorageError;
pub use postgres::PgDocumentStore;
pub use search::{HttpSearchIndex, SearchIndex};
pub use store::DocumentStore;
