use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::Article;
use crate::store::timestamp;

/// List entry: the article without its body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub article_id: String,
    pub image_url: String,
    pub title: String,
    pub subtitle: String,
    pub original_link: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

impl From<Article> for ArticleSummary {
    fn from(a: Article) -> Self {
        Self {
            article_id: a.article_id,
            image_url: a.image_url,
            title: a.title,
            subtitle: a.subtitle,
            original_link: a.original_link,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}
