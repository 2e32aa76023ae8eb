//! Database repository implementation

use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

use crate::error::DbError;
use crate::models::*;

const POST_WITH_VOTES_COLUMNS: &str = r#"
    p.id, p.title, p.content, p.published, p.owner_id, p.created_at,
    u.email AS owner_email, u.created_at AS owner_created_at,
    COUNT(v.post_id) AS votes
"#;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        // Foreign keys are off by default in SQLite; votes and posts rely on them.
        let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Get the underlying pool for advanced usage
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                published INTEGER NOT NULL DEFAULT 1,
                owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts(owner_id)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (post_id, user_id)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::Migration(e.to_string()))?;
        }

        info!("Database migrations completed");
        Ok(())
    }

    // ==================== User Operations ====================

    /// Insert a new user
    ///
    /// Duplicate detection relies on the UNIQUE constraint rather than a
    /// read-before-write, so concurrent registrations of the same email
    /// cannot race past a pre-check.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, created_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("User '{}' already exists", user.email))
        })?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
        })
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| User::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| User::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    // ==================== Post Operations ====================

    /// Insert a new post
    pub async fn insert_post(&self, post: NewPost) -> Result<Post, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, published, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.published)
        .bind(post.owner_id)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Post {
            id,
            title: post.title,
            content: post.content,
            published: post.published,
            owner_id: post.owner_id,
            created_at: now,
        })
    }

    /// Get a post by ID (no vote aggregation)
    pub async fn get_post_by_id(&self, id: i64) -> Result<Option<Post>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, title, content, published, owner_id, created_at
            FROM posts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Post::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a post by ID with its owner and vote count
    pub async fn get_post_with_votes(&self, id: i64) -> Result<Option<PostWithVotes>, DbError> {
        let result = sqlx::query(&format!(
            r#"
            SELECT {POST_WITH_VOTES_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.owner_id
            LEFT JOIN votes v ON v.post_id = p.id
            WHERE p.id = ?
            GROUP BY p.id
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| PostWithVotes::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List posts with owners and vote counts, newest first
    ///
    /// `search` is a substring match on the title; an empty string matches all.
    pub async fn list_posts_with_votes(
        &self,
        limit: i64,
        offset: i64,
        search: &str,
    ) -> Result<Vec<PostWithVotes>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_WITH_VOTES_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.owner_id
            LEFT JOIN votes v ON v.post_id = p.id
            WHERE instr(p.title, ?) > 0 OR ? = ''
            GROUP BY p.id
            ORDER BY p.id DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(search)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| PostWithVotes::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Replace a post's mutable fields
    pub async fn update_post(&self, id: i64, update: PostUpdate) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, content = ?, published = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.title)
        .bind(&update.content)
        .bind(update.published)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a post
    pub async fn delete_post(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Vote Operations ====================

    /// Check whether a user has voted on a post
    pub async fn has_voted(&self, post_id: i64, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM votes WHERE post_id = ? AND user_id = ?
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }

    /// Record a vote
    ///
    /// The composite primary key rejects a second vote; the constraint error
    /// is mapped so a concurrent double-vote still surfaces as a duplicate.
    pub async fn insert_vote(&self, post_id: i64, user_id: i64) -> Result<(), DbError> {
        sqlx::query("INSERT INTO votes (post_id, user_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    format!("User {} has already voted on post {}", user_id, post_id),
                )
            })?;
        Ok(())
    }

    /// Remove a vote
    pub async fn delete_vote(&self, post_id: i64, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM votes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Translate a unique/primary-key constraint violation into a duplicate error
fn map_unique_violation(err: sqlx::Error, message: String) -> DbError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DbError::Duplicate(message)
        }
        _ => DbError::Connection(err),
    }
}
