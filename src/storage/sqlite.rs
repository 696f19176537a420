//! SQLite-backed document store.
//!
//! All collections share one `documents` table. Bodies are JSON text, queried
//! with SQLite's JSON functions.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::storage::document::{is_valid_field, strip_reserved};
use crate::storage::{Document, DocumentStore, ListQuery, Page, SortOrder, StorageError};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        data TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_documents_created ON documents (collection, created_at)",
];

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // Every connection to `:memory:` is a separate database.
        let max_connections = if config.url.contains(":memory:") {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(max_connections, "Document store connected");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed width keeps lexical order equal to time order.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

fn decode(row: &SqliteRow) -> Result<Document, StorageError> {
    let id: String = row.try_get("id")?;
    let raw: String = row.try_get("data")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    let data: Map<String, Value> =
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;

    Ok(Document {
        created_at: parse_timestamp(&id, &created_at)?,
        updated_at: parse_timestamp(&id, &updated_at)?,
        id,
        data,
    })
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    collection: &str,
    filters: &[(String, String)],
) -> Result<(), StorageError> {
    builder.push(" WHERE collection = ");
    builder.push_bind(collection.to_string());

    for (field, value) in filters {
        if !is_valid_field(field) {
            return Err(StorageError::InvalidField(field.clone()));
        }
        // json_extract yields 1/0 for booleans, so JSON literals compare by type.
        let path = format!("$.{field}");
        builder.push(" AND (CASE json_type(data, ");
        builder.push_bind(path.clone());
        builder.push(") WHEN 'true' THEN 'true' WHEN 'false' THEN 'false' WHEN 'null' THEN 'null' ");
        builder.push("ELSE CAST(json_extract(data, ");
        builder.push_bind(path);
        builder.push(") AS TEXT) END) = ");
        builder.push_bind(value.clone());
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StorageError> {
        let id = Uuid::new_v4().to_string();
        let stamp = timestamp(Utc::now());
        let now = parse_timestamp(&id, &stamp)?;
        let document = Document {
            id,
            data: strip_reserved(data),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(collection)
        .bind(&document.id)
        .bind(Value::Object(document.data.clone()).to_string())
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?;

        tracing::debug!(collection, id = %document.id, "Document inserted");
        Ok(document)
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        let row = sqlx::query(
            "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode).transpose()
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Page, StorageError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM documents");
        push_filters(&mut count, collection, &query.filters)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let direction = match query.sort {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let mut select =
            QueryBuilder::<Sqlite>::new("SELECT id, data, created_at, updated_at FROM documents");
        push_filters(&mut select, collection, &query.filters)?;
        select.push(format!(" ORDER BY created_at {direction}, rowid {direction} LIMIT "));
        select.push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
        select.push(" OFFSET ");
        select.push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));

        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(decode).collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
        })
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, StorageError> {
        let patch = Value::Object(strip_reserved(patch)).to_string();

        let result = sqlx::query(
            "UPDATE documents SET data = json_patch(data, ?), updated_at = ? WHERE collection = ? AND id = ?",
        )
        .bind(patch)
        .bind(timestamp(Utc::now()))
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(collection, id).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Document store closed");
    }
}
