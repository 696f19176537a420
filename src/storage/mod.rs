//! Document storage subsystem.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → DocumentStore trait (collection + JSON body)
//!     → sqlite.rs (documents table, JSON text column)
//! ```
//!
//! # Design Decisions
//! - Handlers depend on the trait, never on the driver
//! - Documents are schemaless JSON objects grouped by collection name
//! - Ids and timestamps are assigned by the store

pub mod document;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use document::{Document, ListQuery, Page, SortOrder};
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported database url '{0}'")]
    UnsupportedUrl(String),

    #[error("invalid filter field '{0}'")]
    InvalidField(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt document {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Persistence for schemaless documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StorageError>;

    async fn find(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError>;

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Page, StorageError>;

    /// Apply a JSON merge patch. Returns `None` when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, StorageError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;

    /// Close all connections. Later calls fail.
    async fn close(&self);
}

/// Open the store named by `config.url`.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, StorageError> {
    if config.url.starts_with("sqlite:") {
        let store = SqliteStore::connect(config).await?;
        Ok(Arc::new(store))
    } else {
        Err(StorageError::UnsupportedUrl(config.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unknown_scheme() {
        let config = DatabaseConfig {
            url: "mongodb://localhost/farmerice".to_string(),
            ..DatabaseConfig::default()
        };
        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, StorageError::UnsupportedUrl(_)));
    }
}
