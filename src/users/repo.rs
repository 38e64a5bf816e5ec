use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{User, CREATE_SCHEMA, UPDATE_FIELDS};
use crate::auth::password::hash_password;
use crate::entity;
use crate::error::ModelError;
use crate::store::{timestamp, Direction, DocumentStore, Query};
use crate::validation::{filter_update, pick, require_key, validate};

impl User {
    /// Validate signup data and build an unsaved user with a fresh id and a
    /// hashed password.
    pub fn create(data: &Value) -> Result<User, ModelError> {
        validate(data, CREATE_SCHEMA)?;
        let mut doc = pick(data, CREATE_SCHEMA)?;

        let plain = doc
            .get("password")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let hash = hash_password(plain)?;
        let now = timestamp::to_value(timestamp::now()).map_err(anyhow::Error::from)?;

        doc.insert("password".into(), Value::String(hash));
        doc.insert("userId".into(), json!(Uuid::now_v7().to_string()));
        doc.insert("isPremium".into(), json!(false));
        doc.insert("createdAt".into(), now.clone());
        doc.insert("updatedAt".into(), now);

        serde_json::from_value(Value::Object(doc))
            .map_err(|e| ModelError::Internal(anyhow::anyhow!("build user: {e}")))
    }

    /// Persist a new user. The email probe and the write are two separate
    /// round trips, so two concurrent signups with one email can both pass.
    pub async fn save(&self, store: &dyn DocumentStore) -> Result<String, ModelError> {
        if User::find_one(store, "email", json!(self.email)).await?.is_some() {
            warn!(email = %self.email, "email already registered");
            return Err(ModelError::Conflict("email already exists".into()));
        }
        entity::put(store, self).await?;
        info!(user_id = %self.user_id, "user saved");
        Ok(self.user_id.clone())
    }

    pub async fn find_by_id(store: &dyn DocumentStore, user_id: &str) -> Result<Option<User>, ModelError> {
        entity::fetch(store, user_id).await
    }

    pub async fn find_one(
        store: &dyn DocumentStore,
        field: &str,
        value: Value,
    ) -> Result<Option<User>, ModelError> {
        require_key("field", field)?;
        entity::first(store, field, value).await
    }

    /// All users with `field == value`, by primary key unless `order_by`
    /// names a field.
    pub async fn find(
        store: &dyn DocumentStore,
        field: &str,
        value: Value,
        order_by: Option<&str>,
        direction: Direction,
    ) -> Result<Vec<User>, ModelError> {
        require_key("field", field)?;
        let query = match order_by {
            Some(order) => Query::eq(field, value).order_by(order, direction),
            None => Query::eq(field, value).direction(direction),
        };
        entity::query(store, &query).await
    }

    pub async fn find_all(store: &dyn DocumentStore) -> Result<Vec<User>, ModelError> {
        entity::query(store, &Query::all()).await
    }

    /// Apply allow-listed changes. A new password is hashed here; a new email
    /// goes through the same racy uniqueness probe as [`User::save`].
    pub async fn update(
        store: &dyn DocumentStore,
        user_id: &str,
        partial: &Value,
    ) -> Result<User, ModelError> {
        let current: User = entity::require(store, user_id).await?;
        let mut updates = filter_update(partial, UPDATE_FIELDS)?;

        if let Some(email) = updates.get("email").and_then(Value::as_str) {
            if email != current.email {
                let taken = User::find_one(store, "email", json!(email)).await?;
                if taken.is_some_and(|other| other.user_id != current.user_id) {
                    warn!(%user_id, email, "email already registered");
                    return Err(ModelError::Conflict("email already exists".into()));
                }
            }
        }

        if let Some(plain) = updates.get("password").and_then(Value::as_str) {
            let hash = hash_password(plain)?;
            updates.insert("password".into(), Value::String(hash));
        }

        let user = entity::patch::<User>(store, user_id, updates).await?;
        info!(%user_id, "user updated");
        Ok(user)
    }

    pub async fn delete(store: &dyn DocumentStore, user_id: &str) -> Result<bool, ModelError> {
        entity::remove::<User>(store, user_id).await
    }

    pub async fn find_by_id_and_delete(store: &dyn DocumentStore, user_id: &str) -> Result<bool, ModelError> {
        User::delete(store, user_id).await
    }

    /// Maintenance sweep; failures are logged, not returned.
    pub async fn delete_all(store: &dyn DocumentStore) -> usize {
        entity::clear::<User>(store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::store::MemoryStore;
    use crate::users::repo_types::Gender;
    use crate::validation::ValidationError;

    fn john() -> Value {
        json!({
            "name": "John Doe",
            "email": "john@x.com",
            "password": "pw123456",
            "gender": "male"
        })
    }

    #[test]
    fn create_validates_in_declaration_order() {
        let err = User::create(&json!({})).unwrap_err();
        assert_eq!(err.to_string(), "name is required");

        let err = User::create(&json!({ "name": "John Doe" })).unwrap_err();
        assert_eq!(err.to_string(), "email is required");

        let err = User::create(&json!({ "name": "John Doe", "email": "john@x.com" })).unwrap_err();
        assert_eq!(err.to_string(), "password is required");

        let mut data = john();
        data["gender"] = json!("Male");
        let err = User::create(&data).unwrap_err();
        assert_eq!(err.to_string(), "gender must be one of: male, female");

        let mut data = john();
        data["umur"] = json!("thirty");
        assert!(matches!(
            User::create(&data),
            Err(ModelError::Validation(ValidationError::WrongType { field: "umur", .. }))
        ));
    }

    #[test]
    fn create_ignores_privileged_fields() {
        let mut data = john();
        data["isPremium"] = json!(true);
        data["userId"] = json!("chosen-by-client");
        let user = User::create(&data).unwrap();
        assert!(!user.is_premium);
        assert_ne!(user.user_id, "chosen-by-client");
    }

    #[tokio::test]
    async fn save_then_find_by_id_round_trips() {
        let store = MemoryStore::new();
        let mut data = john();
        data["umur"] = json!(30);
        data["konsumsiBuah"] = json!(false);
        let user = User::create(&data).unwrap();
        let id = user.save(&store).await.unwrap();
        assert_eq!(id, user.user_id);

        let found = User::find_by_id(&store, &id).await.unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(found.name, "John Doe");
        assert_eq!(found.email, "john@x.com");
        assert_eq!(found.gender, Gender::Male);
        assert_eq!(found.umur, Some(30.0));
        assert_eq!(found.konsumsi_buah, Some(false));
        assert_ne!(found.password, "pw123456");
        assert!(verify_password("pw123456", &found.password).unwrap());
    }

    #[tokio::test]
    async fn find_by_id_misses_and_rejects_empty_keys() {
        let store = MemoryStore::new();
        assert!(User::find_by_id(&store, "nope").await.unwrap().is_none());
        assert!(matches!(
            User::find_by_id(&store, "").await,
            Err(ModelError::Validation(ValidationError::InvalidKey { field: "userId" }))
        ));
    }

    #[tokio::test]
    async fn second_save_with_same_email_conflicts() {
        let store = MemoryStore::new();
        User::create(&john()).unwrap().save(&store).await.unwrap();
        let err = User::create(&john()).unwrap().save(&store).await.unwrap_err();
        assert!(matches!(err, ModelError::Conflict(_)));
        assert_eq!(err.to_string(), "email already exists");
    }

    #[tokio::test]
    async fn find_orders_by_created_at() {
        let store = MemoryStore::new();
        let base = timestamp::now();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let mut data = john();
            data["email"] = json!(format!("{name}@x.com"));
            data["name"] = json!("Same Name");
            let mut user = User::create(&data).unwrap();
            user.created_at = base + time::Duration::seconds(i as i64);
            user.save(&store).await.unwrap();
        }
        let users = User::find(
            &store,
            "name",
            json!("Same Name"),
            Some("createdAt"),
            Direction::Desc,
        )
        .await
        .unwrap();
        let emails: Vec<_> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["c@x.com", "b@x.com", "a@x.com"]);
        assert!(users.windows(2).all(|w| w[0].created_at > w[1].created_at));

        let none = User::find(&store, "name", json!("Nobody"), None, Direction::Asc)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_applies_only_allowed_fields() {
        let store = MemoryStore::new();
        let user = User::create(&john()).unwrap();
        let id = user.save(&store).await.unwrap();

        let err = User::update(&store, &id, &json!({ "unknownField": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no valid fields to update");

        let updated = User::update(&store, &id, &json!({ "name": "x", "unknownField": "y" }))
            .await
            .unwrap();
        assert_eq!(updated.name, "x");
        assert_eq!(updated.email, user.email);
        assert!(updated.updated_at >= user.updated_at);

        let stored = store.get("users", &id).await.unwrap().unwrap();
        assert!(!stored.contains_key("unknownField"));
    }

    #[tokio::test]
    async fn update_on_unknown_id_is_not_found_whatever_the_payload() {
        let store = MemoryStore::new();
        for payload in [json!({ "name": "X" }), json!({ "gender": 5 }), json!({})] {
            let err = User::update(&store, "nonexistent-id", &payload)
                .await
                .unwrap_err();
            assert!(matches!(err, ModelError::NotFound { entity: "user", .. }));
        }
    }

    #[tokio::test]
    async fn update_rejects_taken_email_but_allows_own() {
        let store = MemoryStore::new();
        let first = User::create(&john()).unwrap();
        first.save(&store).await.unwrap();
        let mut data = john();
        data["email"] = json!("jane@x.com");
        let second = User::create(&data).unwrap();
        second.save(&store).await.unwrap();

        let err = User::update(&store, &second.user_id, &json!({ "email": "john@x.com" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Conflict(_)));

        let same = User::update(&store, &first.user_id, &json!({ "email": "john@x.com", "name": "J" }))
            .await
            .unwrap();
        assert_eq!(same.name, "J");
    }

    #[tokio::test]
    async fn update_hashes_new_password() {
        let store = MemoryStore::new();
        let user = User::create(&john()).unwrap();
        user.save(&store).await.unwrap();
        let updated = User::update(&store, &user.user_id, &json!({ "password": "new-secret-1" }))
            .await
            .unwrap();
        assert!(verify_password("new-secret-1", &updated.password).unwrap());
        assert!(!verify_password("pw123456", &updated.password).unwrap());
    }

    #[tokio::test]
    async fn delete_is_confirmed_and_not_repeatable() {
        let store = MemoryStore::new();
        let user = User::create(&john()).unwrap();
        let id = user.save(&store).await.unwrap();

        assert!(User::delete(&store, &id).await.unwrap());
        assert!(User::find_by_id(&store, &id).await.unwrap().is_none());
        let err = User::find_by_id_and_delete(&store, &id).await.unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_all_empties_the_collection() {
        let store = MemoryStore::new();
        for i in 0..3 {
            let mut data = john();
            data["email"] = json!(format!("u{i}@x.com"));
            User::create(&data).unwrap().save(&store).await.unwrap();
        }
        assert_eq!(User::delete_all(&store).await, 3);
        assert!(User::find_all(&store).await.unwrap().is_empty());
    }
}
