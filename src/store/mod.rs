//! Document store abstraction.
//!
//! Collections hold schemaless JSON documents keyed by a string primary key.
//! The query surface is intentionally small: one optional equality filter,
//! an optional order (by field or by primary key) and an optional limit.
//! Nothing here is transactional.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

pub mod memory;
pub mod postgres;
pub mod retry;
pub mod timestamp;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use retry::{RetryPolicy, RetryingStore};

/// A stored record: a JSON object.
pub type Document = Map<String, Value>;

/// Documents removed per round trip by [`delete_all`].
pub const BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    /// `None` orders by primary key. Documents lacking the order field are
    /// left out of the result.
    pub order_by: Option<String>,
    pub direction: Direction,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some(Filter {
                field: field.into(),
                value: value.into(),
            }),
            ..Self::default()
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(field.into());
        self.direction = direction;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreErrorKind {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("timed out")]
    Timeout,
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("malformed document: {0}")]
    Decode(String),
    #[error("document does not exist")]
    Missing,
}

/// Failure of a single store operation, with the collection and key it hit.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{op} {collection}/{key}: {kind}")]
pub struct StoreError {
    pub op: &'static str,
    pub collection: String,
    pub key: String,
    pub kind: StoreErrorKind,
}

impl StoreError {
    pub fn new(op: &'static str, collection: &str, key: &str, kind: StoreErrorKind) -> Self {
        Self {
            op,
            collection: collection.to_string(),
            key: key.to_string(),
            kind,
        }
    }

    /// Only network-level failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::Transport(_) | StoreErrorKind::Timeout
        )
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Upsert the whole document.
    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Merge `partial` into an existing document. Fails with
    /// [`StoreErrorKind::Missing`] when there is nothing to merge into.
    async fn update(&self, collection: &str, id: &str, partial: Document)
        -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Delete up to `limit` documents and report how many went.
    async fn batch_delete(&self, collection: &str, limit: usize) -> Result<usize, StoreError>;

    async fn close(&self) {}
}

pub fn encode<T: Serialize>(value: &T, collection: &str, key: &str) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(other) => Err(StoreError::new(
            "encode",
            collection,
            key,
            StoreErrorKind::Decode(format!("expected an object, got {other}")),
        )),
        Err(e) => Err(StoreError::new(
            "encode",
            collection,
            key,
            StoreErrorKind::Decode(e.to_string()),
        )),
    }
}

pub fn decode<T: DeserializeOwned>(doc: Document, collection: &str, key: &str) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc))
        .map_err(|e| StoreError::new("decode", collection, key, StoreErrorKind::Decode(e.to_string())))
}

/// Empty a collection in batches. Best effort: a failing batch is logged and
/// ends the sweep; the count of documents removed so far is returned.
pub async fn delete_all(store: &dyn DocumentStore, collection: &str) -> usize {
    let mut removed = 0;
    loop {
        match store.batch_delete(collection, BATCH_SIZE).await {
            Ok(0) => break,
            Ok(n) => {
                removed += n;
                debug!(collection, batch = n, "batch deleted");
            }
            Err(e) => {
                error!(collection, error = %e, removed, "delete_all aborted");
                break;
            }
        }
    }
    removed
}
