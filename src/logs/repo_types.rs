use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::Entity;
use crate::store::timestamp;
use crate::validation::{FieldKind, FieldSpec};

/// Storage prefix for log images; objects live under `{prefix}/{userId}/`.
pub const IMAGE_PREFIX: &str = "user-logs";

pub const CREATE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::optional("userLogId", FieldKind::String),
    FieldSpec::required("userId", FieldKind::String),
    FieldSpec::required("foodId", FieldKind::String),
    FieldSpec::required("imageUrl", FieldKind::String),
];

/// The only fields `UserLog::update` may change.
pub const UPDATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("foodId", FieldKind::String),
    FieldSpec::required("isDeleted", FieldKind::Boolean),
    FieldSpec::required("imageUrl", FieldKind::String),
];

/// One eaten item. Deleting a log only sets `isDeleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLog {
    pub user_log_id: String,
    pub user_id: String,
    pub food_id: String,
    pub image_url: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

impl Entity for UserLog {
    const COLLECTION: &'static str = "userLogs";
    const KEY_FIELD: &'static str = "userLogId";
    const LABEL: &'static str = "user log";

    fn key(&self) -> &str {
        &self.user_log_id
    }
}
