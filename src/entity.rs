//! Typed access to one collection per entity.
//!
//! Every model stores itself under its primary key, re-reads instead of
//! caching, and shares the not-found / confirm-after-delete behaviour below.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ModelError;
use crate::store::{self, timestamp, Document, DocumentStore, Query, StoreErrorKind};
use crate::validation::require_key;

pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    /// Name of the primary key field, e.g. `userId`.
    const KEY_FIELD: &'static str;
    /// Singular noun used in error messages.
    const LABEL: &'static str;

    fn key(&self) -> &str;
}

pub async fn fetch<E: Entity>(store: &dyn DocumentStore, id: &str) -> Result<Option<E>, ModelError> {
    require_key(E::KEY_FIELD, id)?;
    match store.get(E::COLLECTION, id).await? {
        Some(doc) => Ok(Some(store::decode(doc, E::COLLECTION, id)?)),
        None => Ok(None),
    }
}

/// Like [`fetch`], but absence is an error.
pub async fn require<E: Entity>(store: &dyn DocumentStore, id: &str) -> Result<E, ModelError> {
    fetch(store, id)
        .await?
        .ok_or_else(|| ModelError::not_found(E::LABEL, id))
}

pub async fn put<E: Entity>(store: &dyn DocumentStore, entity: &E) -> Result<(), ModelError> {
    let key = entity.key();
    let doc = store::encode(entity, E::COLLECTION, key)?;
    store.set(E::COLLECTION, key, doc).await?;
    debug!(collection = E::COLLECTION, key, "document saved");
    Ok(())
}

pub async fn query<E: Entity>(store: &dyn DocumentStore, query: &Query) -> Result<Vec<E>, ModelError> {
    store
        .query(E::COLLECTION, query)
        .await?
        .into_iter()
        .map(|doc| store::decode(doc, E::COLLECTION, "*").map_err(ModelError::from))
        .collect()
}

pub async fn first<E: Entity>(
    store: &dyn DocumentStore,
    field: &str,
    value: Value,
) -> Result<Option<E>, ModelError> {
    let mut hits = query::<E>(store, &Query::eq(field, value).limit(1)).await?;
    Ok(hits.pop())
}

/// Merge already-validated `updates`, stamp `updatedAt` and return the
/// refreshed entity.
pub async fn patch<E: Entity>(
    store: &dyn DocumentStore,
    id: &str,
    mut updates: Document,
) -> Result<E, ModelError> {
    let stamp = timestamp::to_value(timestamp::now()).map_err(anyhow::Error::from)?;
    updates.insert("updatedAt".into(), stamp);
    match store.update(E::COLLECTION, id, updates).await {
        Ok(()) => {}
        Err(e) if e.kind == StoreErrorKind::Missing => {
            return Err(ModelError::not_found(E::LABEL, id))
        }
        Err(e) => return Err(e.into()),
    }
    require(store, id).await
}

/// Delete by key. Absent keys fail with not-found; otherwise the result says
/// whether a re-read confirms the document is gone.
pub async fn remove<E: Entity>(store: &dyn DocumentStore, id: &str) -> Result<bool, ModelError> {
    require::<E>(store, id).await?;
    store.delete(E::COLLECTION, id).await?;
    let gone = store.get(E::COLLECTION, id).await?.is_none();
    info!(collection = E::COLLECTION, key = id, gone, "document deleted");
    Ok(gone)
}

pub async fn clear<E: Entity>(store: &dyn DocumentStore) -> usize {
    store::delete_all(store, E::COLLECTION).await
}
