use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::Entity;
use crate::store::timestamp;
use crate::validation::{FieldKind, FieldSpec};

pub const CREATE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::required("foodId", FieldKind::String),
    FieldSpec::required("name", FieldKind::String),
    FieldSpec::required("gula", FieldKind::Number),
    FieldSpec::required("karbohidrat", FieldKind::Number),
    FieldSpec::required("protein", FieldKind::Number),
    FieldSpec::required("lemak", FieldKind::Number),
];

/// Catalog entry keyed by the classifier label. Nutrition values are grams
/// per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub food_id: String,
    pub name: String,
    pub gula: f64,
    pub karbohidrat: f64,
    pub protein: f64,
    pub lemak: f64,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

impl Entity for Food {
    const COLLECTION: &'static str = "foods";
    const KEY_FIELD: &'static str = "foodId";
    const LABEL: &'static str = "food";

    fn key(&self) -> &str {
        &self.food_id
    }
}
