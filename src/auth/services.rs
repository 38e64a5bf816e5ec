use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::dto::AuthResponse;
use super::jwt::JwtKeys;
use super::password::verify_password;
use crate::error::{AppError, ModelError};
use crate::store::DocumentStore;
use crate::users::User;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue_tokens(keys: &JwtKeys, user: User) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        access_token: keys.sign_access(&user.user_id)?,
        refresh_token: keys.sign_refresh(&user.user_id)?,
        user: user.into(),
    })
}

/// Fails with a conflict when `email` already belongs to a user.
pub async fn check_email(store: &dyn DocumentStore, email: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("invalid email".into()));
    }
    if User::find_one(store, "email", json!(email)).await?.is_some() {
        return Err(ModelError::Conflict("email already exists".into()).into());
    }
    Ok(())
}

/// Direct signup: the profile payload goes through `User::create`, which
/// validates it and hashes the password.
pub async fn signup(
    store: &dyn DocumentStore,
    keys: &JwtKeys,
    mut payload: Value,
) -> Result<AuthResponse, AppError> {
    if let Some(Value::String(email)) = payload.get_mut("email") {
        *email = normalize_email(email);
        if !is_valid_email(email) {
            warn!(%email, "invalid email");
            return Err(AppError::BadRequest("invalid email".into()));
        }
    }
    if let Some(password) = payload.get("password").and_then(Value::as_str) {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
    }

    let user = User::create(&payload)?;
    user.save(store).await?;
    info!(user_id = %user.user_id, "user signed up");
    issue_tokens(keys, user)
}

pub async fn login(
    store: &dyn DocumentStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("email and password are required".into()));
    }

    let Some(user) = User::find_one(store, "email", json!(email)).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized("invalid email or password".into()));
    };
    if !verify_password(password, &user.password)? {
        warn!(%email, user_id = %user.user_id, "login invalid password");
        return Err(AppError::Unauthorized("invalid email or password".into()));
    }

    info!(user_id = %user.user_id, "user logged in");
    issue_tokens(keys, user)
}

/// Rotate the token pair. The account must still exist.
pub async fn refresh(
    store: &dyn DocumentStore,
    keys: &JwtKeys,
    refresh_token: &str,
) -> Result<AuthResponse, AppError> {
    let claims = keys.verify_refresh(refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("invalid or expired token".into())
    })?;
    let user = User::find_by_id(store, &claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user not found".into()))?;
    issue_tokens(keys, user)
}

pub async fn change_password(
    store: &dyn DocumentStore,
    user_id: &str,
    old_password: &str,
    new_password: &str,
) -> Result<User, AppError> {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "new password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    let user = User::find_by_id(store, user_id)
        .await?
        .ok_or_else(|| ModelError::not_found("user", user_id))?;

    if !verify_password(old_password, &user.password)? {
        warn!(%user_id, "old password mismatch");
        return Err(AppError::Unauthorized("old password is incorrect".into()));
    }
    if verify_password(new_password, &user.password)? {
        return Err(AppError::BadRequest(
            "new password must be different from the old password".into(),
        ));
    }

    let updated = User::update(store, user_id, &json!({ "password": new_password })).await?;
    info!(%user_id, "password changed");
    Ok(updated)
}
