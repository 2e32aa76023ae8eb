//! Post CRUD routes
//!
//! All routes require authentication. Reads are visible to any authenticated
//! user; update and delete are owner-only, checked after existence so a
//! missing post is 404 rather than 403.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use pinboard_auth::ensure_owner;
use pinboard_db::{NewPost, PostUpdate};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::CurrentUser;
use super::types::{ListPostsParams, PostRequest, PostResponse, PostWithVotesResponse, UserResponse};

/// GET /posts
async fn list_posts(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<Vec<PostWithVotesResponse>>, ApiError> {
    let posts = state
        .db
        .list_posts_with_votes(params.limit, params.skip, &params.search)
        .await?;

    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// POST /posts
async fn create_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    debug!("User {} creating post: {}", user.id, request.title);

    let created = state
        .db
        .insert_post(NewPost {
            title: request.title,
            content: request.content,
            published: request.published,
            owner_id: user.id,
        })
        .await?;

    metrics::counter!("pinboard_posts_created_total").increment(1);
    info!("Created post {} for user {}", created.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(PostResponse::new(created, UserResponse::from(&user))),
    ))
}

/// GET /posts/{id}
async fn get_post(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostWithVotesResponse>, ApiError> {
    let post = state
        .db
        .get_post_with_votes(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("post with id: {} not found", id)))?;

    Ok(Json(post.into()))
}

/// PUT /posts/{id}
async fn update_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .db
        .get_post_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("post with id: {} not found", id)))?;

    ensure_owner(user.id, post.owner_id)?;

    state
        .db
        .update_post(
            id,
            PostUpdate {
                title: request.title,
                content: request.content,
                published: request.published,
            },
        )
        .await?;

    let updated = state
        .db
        .get_post_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("post with id: {} not found", id)))?;

    info!("User {} updated post {}", user.id, id);

    Ok(Json(PostResponse::new(updated, UserResponse::from(&user))))
}

/// DELETE /posts/{id}
async fn delete_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let post = state
        .db
        .get_post_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("post with id: {} not found", id)))?;

    ensure_owner(user.id, post.owner_id)?;

    state.db.delete_post(id).await?;

    info!("User {} deleted post {}", user.id, id);

    Ok(StatusCode::NO_CONTENT)
}

/// Create post routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts", post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}", put(update_post))
        .route("/posts/{id}", delete(delete_post))
}
