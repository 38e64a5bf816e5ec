use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::get,
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::{
    dto::{DailyNutrition, LogEntry, LogView},
    services,
};
use crate::{
    auth::jwt::AuthUser,
    error::AppError,
    images::{read_image_form, MAX_IMAGE_BYTES},
    response::ApiResponse,
    state::AppState,
};

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/me/logs",
            get(list_logs)
                .post(create_log)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/me/logs/:id", get(get_log).delete(delete_log))
        .route("/me/nutrition/today", get(nutrition_today))
}

#[instrument(skip(state))]
pub async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<Vec<LogEntry>>, AppError> {
    let entries =
        services::get_user_logs(state.store(), &user_id, state.config.display_offset()).await?;
    Ok(ApiResponse::ok(entries))
}

/// Multipart fields: `image` and `foodId`.
#[instrument(skip(state, mp))]
pub async fn create_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<ApiResponse<LogView>, AppError> {
    let mut form = read_image_form(mp).await?;
    let image = form.require_image()?;
    let food_id = form
        .text("foodId")
        .ok_or_else(|| AppError::BadRequest("foodId is required".into()))?
        .to_string();

    let log = services::record_log(&state, &user_id, &food_id, image).await?;
    info!(%user_id, user_log_id = %log.user_log_id, %food_id, "food logged");
    Ok(ApiResponse::created(services::view(log, state.config.display_offset())?))
}

#[instrument(skip(state))]
pub async fn get_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(user_log_id): Path<String>,
) -> Result<ApiResponse<LogView>, AppError> {
    let view = services::get_user_log(
        state.store(),
        &user_id,
        &user_log_id,
        state.config.display_offset(),
    )
    .await?;
    Ok(ApiResponse::ok(view))
}

#[instrument(skip(state))]
pub async fn delete_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(user_log_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    services::delete_user_log(state.store(), &user_id, &user_log_id).await?;
    Ok(ApiResponse::empty())
}

#[instrument(skip(state))]
pub async fn nutrition_today(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<DailyNutrition>, AppError> {
    let offset = state.config.display_offset();
    let today = OffsetDateTime::now_utc().to_offset(offset).date();
    let totals = services::daily_nutrition(state.store(), &user_id, today, offset).await?;
    Ok(ApiResponse::ok(totals))
}
