use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::repo_types::{UserLog, CREATE_SCHEMA, UPDATE_FIELDS};
use crate::entity;
use crate::error::ModelError;
use crate::store::{timestamp, Direction, DocumentStore, Query};
use crate::validation::{filter_update, pick, require_key, validate};

impl UserLog {
    pub fn create(data: &Value) -> Result<UserLog, ModelError> {
        validate(data, CREATE_SCHEMA)?;
        let mut doc = pick(data, CREATE_SCHEMA)?;
        if !doc.contains_key("userLogId") {
            doc.insert("userLogId".into(), json!(Uuid::now_v7().to_string()));
        }
        let now = timestamp::to_value(timestamp::now()).map_err(anyhow::Error::from)?;
        doc.insert("isDeleted".into(), json!(false));
        doc.insert("createdAt".into(), now.clone());
        doc.insert("updatedAt".into(), now);
        serde_json::from_value(Value::Object(doc))
            .map_err(|e| ModelError::Internal(anyhow::anyhow!("build user log: {e}")))
    }

    pub async fn save(&self, store: &dyn DocumentStore) -> Result<String, ModelError> {
        entity::put(store, self).await?;
        info!(user_log_id = %self.user_log_id, user_id = %self.user_id, "user log saved");
        Ok(self.user_log_id.clone())
    }

    pub async fn find_by_id(store: &dyn DocumentStore, user_log_id: &str) -> Result<Option<UserLog>, ModelError> {
        entity::fetch(store, user_log_id).await
    }

    /// Soft-deleted logs are included; callers filter.
    pub async fn find(
        store: &dyn DocumentStore,
        field: &str,
        value: Value,
        order_by: Option<&str>,
        direction: Direction,
    ) -> Result<Vec<UserLog>, ModelError> {
        require_key("field", field)?;
        let query = match order_by {
            Some(order) => Query::eq(field, value).order_by(order, direction),
            None => Query::eq(field, value).direction(direction),
        };
        entity::query(store, &query).await
    }

    pub async fn update(
        store: &dyn DocumentStore,
        user_log_id: &str,
        partial: &Value,
    ) -> Result<UserLog, ModelError> {
        entity::require::<UserLog>(store, user_log_id).await?;
        let updates = filter_update(partial, UPDATE_FIELDS)?;
        entity::patch(store, user_log_id, updates).await
    }

    pub async fn delete_all(store: &dyn DocumentStore) -> usize {
        entity::clear::<UserLog>(store).await
    }
}
