use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{dto::PublicUser, repo_types::User};
use crate::{
    auth::{
        jwt::AuthUser,
        services::{is_valid_email, normalize_email},
    },
    error::{AppError, ModelError},
    response::ApiResponse,
    state::AppState,
};

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).patch(update_me).delete(delete_me))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let user = User::find_by_id(state.store(), &user_id)
        .await?
        .ok_or_else(|| ModelError::not_found("user", &user_id))?;
    Ok(ApiResponse::ok(user.into()))
}

/// Profile edits. Password changes go through `PUT /auth/password`, which
/// checks the old one first.
#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut payload): Json<Value>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    if let Some(fields) = payload.as_object_mut() {
        if fields.remove("password").is_some() {
            warn!(%user_id, "password ignored on profile update");
        }
        // Stored normalized, as at signup.
        if let Some(Value::String(email)) = fields.get_mut("email") {
            *email = normalize_email(email);
            if !is_valid_email(email) {
                warn!(%user_id, %email, "invalid email on profile update");
                return Err(AppError::BadRequest("invalid email".into()));
            }
        }
    }
    let user = User::update(state.store(), &user_id, &payload).await?;
    info!(%user_id, "profile updated");
    Ok(ApiResponse::ok(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<()>, AppError> {
    if !User::find_by_id_and_delete(state.store(), &user_id).await? {
        return Err(anyhow::anyhow!("user {user_id} still present after delete").into());
    }
    info!(%user_id, "account deleted");
    Ok(ApiResponse::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::json;

    use crate::app::test_support::{bearer, send};

    async fn seeded() -> (AppState, String) {
        let state = AppState::fake();
        let user = User::create(&json!({
            "name": "John Doe",
            "email": "john@x.com",
            "password": "pw123456",
            "gender": "male"
        }))
        .unwrap();
        let id = user.save(state.store()).await.unwrap();
        (state, id)
    }

    async fn call(state: &AppState, id: &str, method: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri("/api/v1/me")
            .header(header::AUTHORIZATION, bearer(state, id));
        let req = match body {
            Some(v) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string())),
            None => req.body(Body::empty()),
        };
        send(state.clone(), req.unwrap()).await
    }

    #[tokio::test]
    async fn get_me_hides_the_password() {
        let (state, id) = seeded().await;
        let (status, body) = call(&state, &id, "GET", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["userId"], id.as_str());
        assert_eq!(body["data"]["email"], "john@x.com");
        assert!(body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn patch_me_ignores_password_and_unknown_keys() {
        let (state, id) = seeded().await;
        let before = User::find_by_id(state.store(), &id).await.unwrap().unwrap();

        let (status, body) = call(
            &state,
            &id,
            "PATCH",
            Some(json!({ "berat": 70, "password": "hijack-123", "isPremium": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["berat"], 70.0);
        assert_eq!(body["data"]["isPremium"], false);

        let after = User::find_by_id(state.store(), &id).await.unwrap().unwrap();
        assert_eq!(after.password, before.password);

        let (status, body) = call(&state, &id, "PATCH", Some(json!({ "password": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no valid fields to update");
    }

    #[tokio::test]
    async fn patch_me_applies_signup_email_rules() {
        let (state, id) = seeded().await;
        let other = User::create(&json!({
            "name": "Jane Doe",
            "email": "jane@x.com",
            "password": "pw123456",
            "gender": "female"
        }))
        .unwrap();
        other.save(state.store()).await.unwrap();

        let (status, body) = call(&state, &id, "PATCH", Some(json!({ "email": "JANE@X.com" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "email already exists");

        let (status, body) = call(&state, &id, "PATCH", Some(json!({ "email": "a@b" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid email");

        let (status, body) = call(&state, &id, "PATCH", Some(json!({ "email": " John.New@X.com " }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "john.new@x.com");

        let mine = User::find_by_id(state.store(), &id).await.unwrap().unwrap();
        assert_eq!(mine.email, "john.new@x.com");
    }

    #[tokio::test]
    async fn delete_me_then_profile_is_gone() {
        let (state, id) = seeded().await;
        let (status, _) = call(&state, &id, "DELETE", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&state, &id, "GET", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "failed");
    }

    #[tokio::test]
    async fn me_requires_a_token() {
        let (state, _) = seeded().await;
        let req = Request::builder().uri("/api/v1/me").body(Body::empty()).unwrap();
        let (status, body) = send(state, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing Authorization header");
    }
}
