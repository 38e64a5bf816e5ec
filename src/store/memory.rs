use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Direction, Document, DocumentStore, Query, StoreError, StoreErrorKind};

/// In-process document store. Collections are ordered by primary key, which
/// gives the same default ordering the Postgres backend has.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    pending_failures: AtomicU32,
    calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` operations fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.pending_failures.store(n, AtomicOrdering::SeqCst);
    }

    /// Operations attempted so far, failed ones included.
    pub fn calls(&self) -> u64 {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    fn enter(&self, op: &'static str, collection: &str, key: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let injected = self
            .pending_failures
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok();
        if injected {
            return Err(StoreError::new(
                op,
                collection,
                key,
                StoreErrorKind::Transport("injected failure".into()),
            ));
        }
        Ok(())
    }
}

/// Cross-type order for JSON scalars: null < bool < number < string < rest.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.enter("get", collection, id)?;
        let guard = self.collections.read().await;
        Ok(guard.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        self.enter("set", collection, id)?;
        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        self.enter("update", collection, id)?;
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::new("update", collection, id, StoreErrorKind::Missing))?;
        for (field, value) in partial {
            doc.insert(field, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.enter("delete", collection, id)?;
        let mut guard = self.collections.write().await;
        if let Some(docs) = guard.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.enter("query", collection, "*")?;
        let guard = self.collections.read().await;
        let Some(docs) = guard.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(&String, &Document)> = docs
            .iter()
            .filter(|(_, doc)| match &query.filter {
                Some(f) => doc.get(&f.field) == Some(&f.value),
                None => true,
            })
            .collect();

        match &query.order_by {
            Some(field) => {
                hits.retain(|(_, doc)| doc.contains_key(field));
                hits.sort_by(|(ka, a), (kb, b)| {
                    let ord = compare_values(a.get(field), b.get(field));
                    let ord = match query.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    ord.then_with(|| ka.cmp(kb))
                });
            }
            None if query.direction == Direction::Desc => hits.reverse(),
            None => {}
        }

        Ok(hits
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn batch_delete(&self, collection: &str, limit: usize) -> Result<usize, StoreError> {
        self.enter("batch_delete", collection, "*")?;
        let mut guard = self.collections.write().await;
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let doomed: Vec<String> = docs.keys().take(limit).cloned().collect();
        for id in &doomed {
            docs.remove(id);
        }
        Ok(doomed.len())
    }
}
