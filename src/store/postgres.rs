use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{Document, DocumentStore, Query, StoreError, StoreErrorKind};

/// Document collections on top of a single Postgres JSONB table (see
/// `migrations/`).
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn store_error(op: &'static str, collection: &str, key: &str, e: sqlx::Error) -> StoreError {
    let kind = match &e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreErrorKind::Transport(e.to_string()),
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
            StoreErrorKind::Decode(e.to_string())
        }
        _ => StoreErrorKind::Rejected(e.to_string()),
    };
    StoreError::new(op, collection, key, kind)
}

fn into_document(
    op: &'static str,
    collection: &str,
    key: &str,
    value: Value,
) -> Result<Document, StoreError> {
    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::new(
            op,
            collection,
            key,
            StoreErrorKind::Decode(format!("stored value is not an object: {other}")),
        )),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Value>>(
            r#"
            SELECT data
              FROM documents
             WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("get", collection, id, e))?;

        row.map(|Json(value)| into_document("get", collection, id, value))
            .transpose()
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(doc)))
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("set", collection, id, e))?;
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
               SET data = data || $3
             WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(partial)))
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("update", collection, id, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::new(
                "update",
                collection,
                id,
                StoreErrorKind::Missing,
            ));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete", collection, id, e))?;
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT data FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());

        if let Some(filter) = &query.filter {
            qb.push(" AND data @> jsonb_build_object(");
            qb.push_bind(filter.field.clone());
            qb.push(", ");
            qb.push_bind(Json(filter.value.clone()));
            qb.push(")");
        }

        let direction = query.direction.as_sql();
        match &query.order_by {
            Some(field) => {
                qb.push(" AND data ? ");
                qb.push_bind(field.clone());
                qb.push(" ORDER BY data -> ");
                qb.push_bind(field.clone());
                qb.push(format!(" {direction}, id ASC"));
            }
            None => {
                qb.push(format!(" ORDER BY id {direction}"));
            }
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("query", collection, "*", e))?;

        rows.into_iter()
            .map(|Json(value)| into_document("query", collection, "*", value))
            .collect()
    }

    async fn batch_delete(&self, collection: &str, limit: usize) -> Result<usize, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
             WHERE collection = $1
               AND id IN (
                   SELECT id FROM documents
                    WHERE collection = $1
                    ORDER BY id
                    LIMIT $2
               )
            "#,
        )
        .bind(collection)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("batch_delete", collection, "*", e))?;
        Ok(result.rows_affected() as usize)
    }

    async fn close(&self) {
        info!("closing database pool");
        self.pool.close().await;
    }
}
