//! User registration and lookup routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use pinboard_auth::hash_password;
use pinboard_db::NewUser;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CreateUserRequest, UserResponse};

/// POST /users
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::Unprocessable(
            "Email and password are required".to_string(),
        ));
    }

    debug!("Creating user: {}", request.email);

    let password_hash = hash_password(&request.password)?;

    let user = state
        .db
        .insert_user(NewUser {
            email: request.email,
            password_hash,
        })
        .await?;

    metrics::counter!("pinboard_signups_total").increment(1);
    info!("Created user: {}", user.email);

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user with id: {} not found", id)))?;

    Ok(Json(UserResponse::from(&user)))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
}
