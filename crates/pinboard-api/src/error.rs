//! API error types

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] pinboard_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] pinboard_auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            // Unknown email and wrong password share this variant on purpose:
            // callers must not be able to tell which one failed.
            ApiError::InvalidCredentials => {
                (StatusCode::FORBIDDEN, "Invalid credentials".to_string())
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Could not validate credentials".to_string(),
            ),
            ApiError::Database(e) => match e {
                pinboard_db::DbError::Duplicate(msg) => (StatusCode::CONFLICT, msg.clone()),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                ),
            },
            ApiError::Auth(e) => match e {
                pinboard_auth::AuthError::NotResourceOwner => (
                    StatusCode::FORBIDDEN,
                    "Not authorized to perform requested action".to_string(),
                ),
                pinboard_auth::AuthError::PasswordHash(_)
                | pinboard_auth::AuthError::UnsupportedAlgorithm(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                ),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    "Could not validate credentials".to_string(),
                ),
            },
        };

        let body = axum::Json(json!({
            "error": message
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            // Bearer challenge for clients missing or holding a bad token
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
