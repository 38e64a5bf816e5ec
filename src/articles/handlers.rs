use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::ArticleSummary,
    repo_types::{Article, IMAGE_PREFIX},
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, ModelError},
    images::{read_image_form, MAX_IMAGE_BYTES},
    response::ApiResponse,
    state::AppState,
};

pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/articles",
            get(list_articles)
                .post(create_article)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/articles/:id", get(get_article).delete(delete_article))
}

#[instrument(skip(state))]
pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ArticleSummary>>, AppError> {
    let articles = Article::find_all(state.store()).await?;
    Ok(ApiResponse::ok(articles.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> Result<ApiResponse<Article>, AppError> {
    let article = Article::find_by_id(state.store(), &article_id)
        .await?
        .ok_or_else(|| ModelError::not_found("article", &article_id))?;
    Ok(ApiResponse::ok(article))
}

/// Multipart fields: `image`, `title`, `subtitle`, optional `content` and
/// `originalLink`. The text is validated before the image is uploaded, and
/// the upload is removed again if the save fails.
#[instrument(skip(state, mp))]
pub async fn create_article(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<ApiResponse<Article>, AppError> {
    let mut form = read_image_form(mp).await?;
    let image = form.require_image()?;

    let article_id = Uuid::now_v7().to_string();
    let key = image.key(IMAGE_PREFIX, &article_id);
    let mut article = Article::create(&json!({
        "articleId": article_id,
        "imageUrl": key,
        "title": form.text("title"),
        "subtitle": form.text("subtitle"),
        "content": form.text("content"),
        "originalLink": form.text("originalLink"),
    }))?;

    article.image_url = state
        .storage
        .put_object(&key, image.body, &image.content_type)
        .await
        .map_err(AppError::Upstream)?;

    if let Err(e) = article.save(state.store()).await {
        if let Err(cleanup) = state.storage.delete_object(&key).await {
            error!(error = %cleanup, %key, "orphaned article image");
        }
        return Err(e.into());
    }

    info!(%user_id, %article_id, "article created");
    Ok(ApiResponse::created(article))
}

#[instrument(skip(state))]
pub async fn delete_article(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(article_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let article = Article::find_by_id(state.store(), &article_id)
        .await?
        .ok_or_else(|| ModelError::not_found("article", &article_id))?;

    if !Article::find_by_id_and_delete(state.store(), &article_id).await? {
        return Err(anyhow::anyhow!("article {article_id} still present after delete").into());
    }

    match article.image_key(IMAGE_PREFIX) {
        Some(key) => {
            if let Err(e) = state.storage.delete_object(&key).await {
                warn!(error = %e, %key, "article image not removed");
            }
        }
        None => warn!(%article_id, image_url = %article.image_url, "no image key to remove"),
    }

    info!(%user_id, %article_id, "article deleted");
    Ok(ApiResponse::empty())
}
