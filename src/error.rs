use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors raised by the entity models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ModelError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Errors returned from HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("upstream service failed")]
    Upstream(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        Self::Model(ModelError::Validation(e))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Model(ModelError::Validation(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Model(ModelError::Unauthorized(_)) | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Model(ModelError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Model(ModelError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Model(ModelError::Store(_) | ModelError::Internal(_))
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Model(ModelError::Store(e)) => {
                error!(error = %e, "store failure");
                "internal error".to_string()
            }
            AppError::Model(ModelError::Internal(e)) | AppError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal error".to_string()
            }
            AppError::Upstream(e) => {
                error!(error = %e, "upstream failure");
                self.to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "status": "failed", "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorKind;
    use axum::body::to_bytes;

    async fn assert_error(error: AppError, expected_status: StatusCode, expected_message: &str) {
        let resp = error.into_response();
        assert_eq!(resp.status(), expected_status);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"], expected_message);
    }

    #[tokio::test]
    async fn validation_is_bad_request() {
        assert_error(
            ValidationError::Missing { field: "name" }.into(),
            StatusCode::BAD_REQUEST,
            "name is required",
        )
        .await;
    }

    #[tokio::test]
    async fn not_found_names_the_entity() {
        assert_error(
            ModelError::not_found("user", "abc").into(),
            StatusCode::NOT_FOUND,
            "user abc not found",
        )
        .await;
    }

    #[tokio::test]
    async fn conflict_and_unauthorized() {
        assert_error(
            ModelError::Conflict("email already exists".into()).into(),
            StatusCode::CONFLICT,
            "email already exists",
        )
        .await;
        assert_error(
            ModelError::Unauthorized("user not authorized".into()).into(),
            StatusCode::UNAUTHORIZED,
            "user not authorized",
        )
        .await;
    }

    #[tokio::test]
    async fn store_details_are_not_leaked() {
        let err = StoreError::new(
            "get",
            "users",
            "abc",
            StoreErrorKind::Transport("connection reset".into()),
        );
        assert_error(
            ModelError::from(err).into(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error",
        )
        .await;
    }

    #[tokio::test]
    async fn upstream_is_bad_gateway() {
        assert_error(
            AppError::Upstream(anyhow::anyhow!("classifier down")),
            StatusCode::BAD_GATEWAY,
            "upstream service failed",
        )
        .await;
    }
}
