use axum::{
    extract::{FromRef, Query, State},
    routing::{post, put},
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use super::{
    dto::{AuthResponse, ChangePasswordRequest, EmailQuery, LoginRequest, RefreshRequest},
    jwt::{AuthUser, JwtKeys},
    services,
};
use crate::{error::AppError, response::ApiResponse, state::AppState, users::PublicUser};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup).get(check_email))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/password", put(change_password))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let resp = services::signup(state.store(), &keys, payload).await?;
    Ok(ApiResponse::created(resp))
}

#[instrument(skip(state))]
pub async fn check_email(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<ApiResponse<()>, AppError> {
    let email = q
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("email is required".into()))?;
    services::check_email(state.store(), &email).await?;
    Ok(ApiResponse::empty())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let resp = services::login(state.store(), &keys, &payload.email, &payload.password).await?;
    Ok(ApiResponse::ok(resp))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let resp = services::refresh(state.store(), &keys, &payload.refresh_token).await?;
    Ok(ApiResponse::ok(resp))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let user = services::change_password(
        state.store(),
        &user_id,
        &payload.password,
        &payload.new_password,
    )
    .await?;
    Ok(ApiResponse::ok(user.into()))
}
