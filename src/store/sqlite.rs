use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, Fields, Filter, StoreError};
use crate::db::DbPool;

/// Documents kept as JSON text in a single SQLite table, keyed by collection.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: DbPool,
}

impl SqliteDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn document_from_row(row: SqliteRow) -> Result<Document, StoreError> {
    let body: String = row.try_get("body")?;
    let fields = match serde_json::from_str::<Value>(&body)? {
        Value::Object(map) => map,
        _ => Fields::new(),
    };
    Ok(Document {
        id: row.try_get("id")?,
        created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
        updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at")?,
        fields,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let body = serde_json::to_string(&fields)?;
        sqlx::query(
            "INSERT INTO documents (id, collection, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(collection)
        .bind(body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        debug!(collection, %id, "document inserted");
        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, body, created_at, updated_at FROM documents WHERE collection = ",
        );
        query.push_bind(collection);
        if let Some(id) = filter.id() {
            query.push(" AND id = ").push_bind(id);
        }
        for (field, value) in filter.fields() {
            query
                .push(" AND json_extract(body, ")
                .push_bind(format!("$.\"{field}\""))
                .push(") = json_extract(")
                .push_bind(value.to_string())
                .push(", '$')");
        }
        query
            .push(" ORDER BY seq LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(document_from_row).collect()
    }

    async fn list_collections(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT collection FROM documents ORDER BY collection LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
