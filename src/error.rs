use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// One violated constraint on a request field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Everything an auth route can fail with. Only `Internal` carries detail,
/// and that detail is logged, never returned.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("email already registered")]
    Conflict,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::Conflict,
            other => AuthError::Internal(anyhow::Error::new(other)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AuthError::Validation(errors) => ErrorBody {
                message: "Validation failed",
                errors,
            },
            AuthError::Conflict => ErrorBody {
                message: "Email already registered",
                errors: Vec::new(),
            },
            AuthError::InvalidCredentials => ErrorBody {
                message: "Invalid credentials",
                errors: Vec::new(),
            },
            AuthError::Unauthenticated => ErrorBody {
                message: "Unauthenticated",
                errors: Vec::new(),
            },
            AuthError::Internal(e) => {
                error!(error = %format!("{e:#}"), "internal error");
                ErrorBody {
                    message: "Internal server error",
                    errors: Vec::new(),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AuthError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_lists_every_field() {
        let (status, json) = body_json(AuthError::Validation(vec![
            FieldError::new("name", "too short"),
            FieldError::new("password", "too short"),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
        assert_eq!(json["errors"][1]["field"], "password");
    }

    #[tokio::test]
    async fn internal_detail_is_not_returned() {
        let (status, json) =
            body_json(AuthError::Internal(anyhow::anyhow!("pool timed out on 10.0.0.5"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({ "message": "Internal server error" }));
    }

    #[test]
    fn duplicate_email_maps_to_conflict() {
        assert!(matches!(
            AuthError::from(StoreError::DuplicateEmail),
            AuthError::Conflict
        ));
        assert_eq!(AuthError::Conflict.status(), StatusCode::CONFLICT);
    }
}
