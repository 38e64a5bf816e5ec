use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::repo_types::{Article, CREATE_SCHEMA};
use crate::entity;
use crate::error::ModelError;
use crate::store::{timestamp, Direction, DocumentStore, Query};
use crate::validation::{pick, validate};

impl Article {
    /// Validate and build an unsaved article. `articleId` is kept when the
    /// caller supplies one, otherwise generated.
    pub fn create(data: &Value) -> Result<Article, ModelError> {
        validate(data, CREATE_SCHEMA)?;
        let mut doc = pick(data, CREATE_SCHEMA)?;
        if !doc.contains_key("articleId") {
            doc.insert("articleId".into(), json!(Uuid::now_v7().to_string()));
        }
        let now = timestamp::to_value(timestamp::now()).map_err(anyhow::Error::from)?;
        doc.insert("createdAt".into(), now.clone());
        doc.insert("updatedAt".into(), now);
        serde_json::from_value(Value::Object(doc))
            .map_err(|e| ModelError::Internal(anyhow::anyhow!("build article: {e}")))
    }

    pub async fn save(&self, store: &dyn DocumentStore) -> Result<String, ModelError> {
        entity::put(store, self).await?;
        info!(article_id = %self.article_id, "article saved");
        Ok(self.article_id.clone())
    }

    pub async fn find_by_id(store: &dyn DocumentStore, article_id: &str) -> Result<Option<Article>, ModelError> {
        entity::fetch(store, article_id).await
    }

    /// Newest first.
    pub async fn find_all(store: &dyn DocumentStore) -> Result<Vec<Article>, ModelError> {
        entity::query(store, &Query::all().order_by("createdAt", Direction::Desc)).await
    }

    pub async fn find_by_id_and_delete(store: &dyn DocumentStore, article_id: &str) -> Result<bool, ModelError> {
        entity::remove::<Article>(store, article_id).await
    }

    pub async fn delete_all(store: &dyn DocumentStore) -> usize {
        entity::clear::<Article>(store).await
    }

    /// Storage key of the image, taken from the last path segment of its URL.
    pub fn image_key(&self, prefix: &str) -> Option<String> {
        self.image_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(|name| format!("{prefix}/{name}"))
    }
}
