use serde_json::{json, Value};
use tracing::{info, warn};

use super::repo_types::{Food, CREATE_SCHEMA};
use crate::entity;
use crate::error::ModelError;
use crate::store::{timestamp, DocumentStore};
use crate::validation::{pick, validate};

impl Food {
    pub fn create(data: &Value) -> Result<Food, ModelError> {
        validate(data, CREATE_SCHEMA)?;
        let mut doc = pick(data, CREATE_SCHEMA)?;
        let now = timestamp::to_value(timestamp::now()).map_err(anyhow::Error::from)?;
        doc.insert("createdAt".into(), now.clone());
        doc.insert("updatedAt".into(), now);
        serde_json::from_value(Value::Object(doc))
            .map_err(|e| ModelError::Internal(anyhow::anyhow!("build food: {e}")))
    }

    /// Upsert under `foodId`; catalog reloads overwrite.
    pub async fn save(&self, store: &dyn DocumentStore) -> Result<String, ModelError> {
        entity::put(store, self).await?;
        Ok(self.food_id.clone())
    }

    pub async fn find_by_id(store: &dyn DocumentStore, food_id: &str) -> Result<Option<Food>, ModelError> {
        entity::fetch(store, food_id).await
    }

    /// Bulk load a catalog. Invalid entries are skipped with a warning; store
    /// failures abort. Returns how many were saved.
    pub async fn seed(store: &dyn DocumentStore, entries: &[Value]) -> Result<usize, ModelError> {
        let mut saved = 0;
        for (index, data) in entries.iter().enumerate() {
            let food = match Food::create(data) {
                Ok(food) => food,
                Err(ModelError::Validation(e)) => {
                    warn!(index, error = %e, "catalog entry skipped");
                    continue;
                }
                Err(e) => return Err(e),
            };
            food.save(store).await?;
            saved += 1;
        }
        info!(saved, total = entries.len(), "food catalog seeded");
        Ok(saved)
    }

    /// Nutrition fields in the shape listings and predictions merge in.
    pub fn nutrition(&self) -> Value {
        json!({
            "name": self.name,
            "gula": self.gula,
            "karbohidrat": self.karbohidrat,
            "lemak": self.lemak,
            "protein": self.protein,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::validation::ValidationError;

    fn energen() -> Value {
        json!({
            "foodId": "Energen-Cokelat-34g",
            "name": "Energen Cokelat 34g",
            "gula": 10,
            "karbohidrat": 24,
            "protein": 3,
            "lemak": 3.5
        })
    }

    #[tokio::test]
    async fn save_and_find() {
        let store = MemoryStore::new();
        let food = Food::create(&energen()).unwrap();
        assert_eq!(food.save(&store).await.unwrap(), "Energen-Cokelat-34g");

        let found = Food::find_by_id(&store, "Energen-Cokelat-34g").await.unwrap().unwrap();
        assert_eq!(found.gula, 10.0);
        assert_eq!(found.lemak, 3.5);
        assert!(Food::find_by_id(&store, "Unknown").await.unwrap().is_none());
        assert!(Food::find_by_id(&store, "").await.is_err());
    }

    #[test]
    fn nutrition_must_be_numeric() {
        let mut data = energen();
        data["gula"] = json!("10");
        assert!(matches!(
            Food::create(&data),
            Err(ModelError::Validation(ValidationError::WrongType { field: "gula", .. }))
        ));
        let mut data = energen();
        data["protein"] = json!(0);
        assert_eq!(Food::create(&data).unwrap().protein, 0.0);
    }

    #[tokio::test]
    async fn seed_skips_invalid_entries() {
        let store = MemoryStore::new();
        let mut broken = energen();
        broken["foodId"] = json!("Broken");
        broken.as_object_mut().unwrap().remove("lemak");
        let saved = Food::seed(&store, &[energen(), broken]).await.unwrap();
        assert_eq!(saved, 1);
        assert!(Food::find_by_id(&store, "Broken").await.unwrap().is_none());
    }
}
