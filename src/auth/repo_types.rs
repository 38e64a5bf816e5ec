use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::Entity;
use crate::store::timestamp;
use crate::validation::{FieldKind, FieldSpec};

pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;
pub const OTP_TTL_MINUTES: i64 = 10;

pub const CREATE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::required("email", FieldKind::Email),
    FieldSpec::required("name", FieldKind::String),
    FieldSpec::required("password", FieldKind::String),
];

/// Pending signup waiting for its one-time code, keyed by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuth {
    pub email: String,
    pub name: String,
    /// Argon2 PHC string.
    pub password: String,
    pub otp_code: u32,
    #[serde(with = "timestamp")]
    pub expired_at: OffsetDateTime,
}

impl Entity for UserAuth {
    const COLLECTION: &'static str = "usersAuth";
    const KEY_FIELD: &'static str = "email";
    const LABEL: &'static str = "pending signup";

    fn key(&self) -> &str {
        &self.email
    }
}
