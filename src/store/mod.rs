pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Native body of a stored document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("document {id} in `{collection}` has invalid field `{field}`: {reason}")]
    InvalidField {
        collection: &'static str,
        id: String,
        field: &'static str,
        reason: String,
    },
    #[error("document store is unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fields: Fields,
}

impl Document {
    fn invalid(&self, collection: &'static str, field: &'static str, reason: &str) -> StoreError {
        StoreError::InvalidField {
            collection,
            id: self.id.clone(),
            field,
            reason: reason.to_string(),
        }
    }

    pub fn required_str(
        &self,
        collection: &'static str,
        field: &'static str,
    ) -> Result<String, StoreError> {
        match self.fields.get(field) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(self.invalid(collection, field, "expected a string")),
            None => Err(self.invalid(collection, field, "missing")),
        }
    }

    pub fn optional_str(
        &self,
        collection: &'static str,
        field: &'static str,
    ) -> Result<Option<String>, StoreError> {
        match self.fields.get(field) {
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(self.invalid(collection, field, "expected a string or null")),
        }
    }

    pub fn required_i64(
        &self,
        collection: &'static str,
        field: &'static str,
    ) -> Result<i64, StoreError> {
        match self.fields.get(field) {
            Some(value) => value
                .as_i64()
                .ok_or_else(|| self.invalid(collection, field, "expected an integer")),
            None => Err(self.invalid(collection, field, "missing")),
        }
    }

    pub fn optional_timestamp(
        &self,
        collection: &'static str,
        field: &'static str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.optional_str(collection, field)? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(|err| self.invalid(collection, field, &err.to_string())),
            None => Ok(None),
        }
    }
}

/// Conjunction of an optional id match and top-level field equality matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    id: Option<String>,
    fields: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Vec::new(),
        }
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(id) = &self.id {
            if doc.id != *id {
                return false;
            }
        }
        self.fields
            .iter()
            .all(|(field, expected)| doc.fields.get(field) == Some(expected))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persists one document and returns its generated id.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Matching documents in insertion order, capped at `limit`.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.find(collection, filter, 1).await?.into_iter().next())
    }

    async fn list_collections(&self, limit: usize) -> Result<Vec<String>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}
