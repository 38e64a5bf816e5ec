use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::Entity;
use crate::store::timestamp;
use crate::validation::{FieldKind, FieldSpec};

/// Storage prefix for article images.
pub const IMAGE_PREFIX: &str = "articles";

pub const CREATE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::optional("articleId", FieldKind::String),
    FieldSpec::required("imageUrl", FieldKind::String),
    FieldSpec::required("title", FieldKind::String),
    FieldSpec::required("subtitle", FieldKind::String),
    FieldSpec::optional("content", FieldKind::String),
    FieldSpec::optional("originalLink", FieldKind::String),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub article_id: String,
    pub image_url: String,
    pub title: String,
    pub subtitle: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub original_link: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

impl Entity for Article {
    const COLLECTION: &'static str = "articles";
    const KEY_FIELD: &'static str = "articleId";
    const LABEL: &'static str = "article";

    fn key(&self) -> &str {
        &self.article_id
    }
}
