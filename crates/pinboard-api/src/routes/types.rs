//! Request/Response DTOs

use chrono::{DateTime, Utc};
use pinboard_db::{Post, PostWithVotes, User};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Login form (OAuth2 password-flow style: `username` carries the email)
///
/// Fields default to empty so missing-field handling happens in the handler,
/// before any database access.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response
#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// ==================== User Types ====================

/// Registration request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// User response (never carries the password hash)
#[derive(Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

// ==================== Post Types ====================

/// Create/update post request
#[derive(Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

/// Post response including its owner
#[derive(Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub owner: UserResponse,
}

impl PostResponse {
    pub fn new(post: Post, owner: UserResponse) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            owner_id: post.owner_id,
            created_at: post.created_at,
            owner,
        }
    }
}

impl From<PostWithVotes> for PostResponse {
    fn from(row: PostWithVotes) -> Self {
        let owner = UserResponse {
            id: row.post.owner_id,
            email: row.owner_email,
            created_at: row.owner_created_at,
        };
        Self::new(row.post, owner)
    }
}

/// Post response with its aggregated vote count
#[derive(Serialize, Deserialize)]
pub struct PostWithVotesResponse {
    pub post: PostResponse,
    pub votes: i64,
}

impl From<PostWithVotes> for PostWithVotesResponse {
    fn from(row: PostWithVotes) -> Self {
        let votes = row.votes;
        Self {
            post: row.into(),
            votes,
        }
    }
}

/// Post listing query parameters
#[derive(Deserialize)]
pub struct ListPostsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub search: String,
}

fn default_limit() -> i64 {
    10
}

// ==================== Vote Types ====================

/// Vote request: `dir` 1 adds a vote, 0 removes it
#[derive(Deserialize)]
pub struct VoteRequest {
    pub post_id: i64,
    pub dir: u8,
}
