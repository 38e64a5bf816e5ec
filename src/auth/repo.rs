use rand::Rng;
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tracing::info;

use super::password::hash_password;
use super::repo_types::{UserAuth, CREATE_SCHEMA, OTP_MAX, OTP_MIN, OTP_TTL_MINUTES};
use crate::entity;
use crate::error::ModelError;
use crate::store::{timestamp, DocumentStore};
use crate::validation::validate;

impl UserAuth {
    /// Build a pending signup with a fresh code valid for ten minutes.
    pub fn create(data: &Value) -> Result<UserAuth, ModelError> {
        validate(data, CREATE_SCHEMA)?;
        let field = |name: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(UserAuth {
            email: field("email"),
            name: field("name"),
            password: hash_password(&field("password"))?,
            otp_code: rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX),
            expired_at: timestamp::now() + Duration::minutes(OTP_TTL_MINUTES),
        })
    }

    pub async fn save(&self, store: &dyn DocumentStore) -> Result<String, ModelError> {
        entity::put(store, self).await?;
        info!(email = %self.email, "pending signup saved");
        Ok(self.email.clone())
    }

    pub async fn find_by_email(
        store: &dyn DocumentStore,
        email: &str,
    ) -> Result<Option<UserAuth>, ModelError> {
        entity::fetch(store, email).await
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expired_at
    }

    /// True when a pending signup exists for `email`, `code` matches and the
    /// code has not expired.
    pub async fn verify_otp(
        store: &dyn DocumentStore,
        email: &str,
        code: u32,
    ) -> Result<bool, ModelError> {
        let Some(pending) = UserAuth::find_by_email(store, email).await? else {
            return Ok(false);
        };
        Ok(pending.otp_code == code && !pending.is_expired_at(OffsetDateTime::now_utc()))
    }

    pub async fn delete_all(store: &dyn DocumentStore) -> usize {
        entity::clear::<UserAuth>(store).await
    }
}
