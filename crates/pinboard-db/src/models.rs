//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_datetime_or_now(row.try_get::<String, _>("created_at")?.as_str()),
        })
    }
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Post model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for Post {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            published: row.try_get("published")?,
            owner_id: row.try_get("owner_id")?,
            created_at: parse_datetime_or_now(row.try_get::<String, _>("created_at")?.as_str()),
        })
    }
}

/// New post (for insertion)
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub published: bool,
    pub owner_id: i64,
}

/// Post field updates (full replacement, owner never changes)
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    pub published: bool,
}

/// Post joined with its owner and aggregated vote count
#[derive(Debug, Clone, Serialize)]
pub struct PostWithVotes {
    pub post: Post,
    pub owner_email: String,
    pub owner_created_at: DateTime<Utc>,
    pub votes: i64,
}

impl TryFrom<&SqliteRow> for PostWithVotes {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(PostWithVotes {
            post: Post::try_from(row)?,
            owner_email: row.try_get("owner_email")?,
            owner_created_at: parse_datetime_or_now(
                row.try_get::<String, _>("owner_created_at")?.as_str(),
            ),
            votes: row.try_get("votes")?,
        })
    }
}

/// Vote model (composite key, no surrogate id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub post_id: i64,
    pub user_id: i64,
}
