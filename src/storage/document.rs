//! Stored document and query types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys owned by the store; client-supplied values for them are dropped.
pub const RESERVED_KEYS: [&str; 4] = ["id", "_id", "createdAt", "updatedAt"];

/// A JSON document in a named collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Remove store-managed keys from a client body.
pub fn strip_reserved(mut data: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        data.remove(key);
    }
    data
}

/// Ordering by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Listing parameters for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Equality filters on top-level fields, compared as text.
    pub filters: Vec<(String, String)>,
    pub offset: u64,
    pub limit: u64,
    pub sort: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            offset: 0,
            limit: 20,
            sort: SortOrder::Descending,
        }
    }
}

/// One page of a listing plus the unpaged match count.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Document>,
    pub total: u64,
}

/// Field names usable in filters: ASCII letters, digits and underscores.
pub fn is_valid_field(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
