//! Voting route

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::CurrentUser;
use super::types::VoteRequest;

/// POST /vote
///
/// `dir` 1 adds the caller's vote on a post, `dir` 0 removes it.
async fn vote(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    match request.dir {
        1 => {
            let post = state.db.get_post_by_id(request.post_id).await?;
            if post.is_none() {
                return Err(ApiError::NotFound(format!(
                    "post with id: {} not found",
                    request.post_id
                )));
            }

            state.db.insert_vote(request.post_id, user.id).await?;
            debug!("User {} voted on post {}", user.id, request.post_id);

            Ok((
                StatusCode::CREATED,
                Json(json!({"message": "successfully added vote"})),
            ))
        }
        0 => {
            let removed = state.db.delete_vote(request.post_id, user.id).await?;
            if !removed {
                return Err(ApiError::NotFound("Vote does not exist".to_string()));
            }
            debug!("User {} removed vote on post {}", user.id, request.post_id);

            Ok((
                StatusCode::OK,
                Json(json!({"message": "successfully deleted vote"})),
            ))
        }
        _ => Err(ApiError::Unprocessable("dir must be 0 or 1".to_string())),
    }
}

/// Create vote routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/vote", post(vote))
}
