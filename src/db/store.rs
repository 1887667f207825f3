//! Persistence for users, genre preferences and ratings.
//!
//! The `UserStore` trait is the seam the handlers and the
//! recommendation engine depend on; `PostgresUserStore` is the sqlx
//! implementation over the relational schema in `migrations/`.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{TopRatedItem, User, UserRating},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Case-insensitive exact-match lookup
    async fn find_by_name(&self, name: &str) -> AppResult<Option<User>>;

    /// Creates a user and any initial genre preferences in one transaction
    async fn create_user(&self, name: &str, genre_ids: &[i64]) -> AppResult<User>;

    async fn preferred_genres(&self, user_id: i32) -> AppResult<Vec<i64>>;

    /// Replaces the user's whole preference set (delete-all-then-insert,
    /// atomic; no partial set is ever visible)
    async fn replace_preferences(&self, user_id: i32, genre_ids: &[i64]) -> AppResult<()>;

    /// Inserts a rating, or overwrites score and timestamp when the user
    /// has already rated the item
    async fn upsert_rating(
        &self,
        user_id: i32,
        item_id: i64,
        is_show: bool,
        score: f64,
    ) -> AppResult<()>;

    /// All ratings by one user, newest first
    async fn ratings_for_user(&self, user_id: i32) -> AppResult<Vec<UserRating>>;

    /// Items other users rated well: grouped by item identity, filtered
    /// to cross-user averages at or above `min_score`, ordered by
    /// average descending with item id as the stable tie-break
    async fn top_rated_excluding(
        &self,
        user_id: i32,
        min_score: f64,
        limit: i64,
    ) -> AppResult<Vec<TopRatedItem>>;
}

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at FROM users WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, name: &str, genre_ids: &[i64]) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, created_at)
            VALUES ($1, now())
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(format!("A user named '{}' already exists", name))
            }
            _ => AppError::Database(e),
        })?;

        if !genre_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO user_preferences (user_id, genre_id)
                SELECT $1, unnest($2::bigint[])
                "#,
            )
            .bind(user.id)
            .bind(genre_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(user_id = user.id, name = %user.name, "User created");

        Ok(user)
    }

    async fn preferred_genres(&self, user_id: i32) -> AppResult<Vec<i64>> {
        let genre_ids = sqlx::query_scalar::<_, i64>(
            "SELECT genre_id FROM user_preferences WHERE user_id = $1 ORDER BY genre_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genre_ids)
    }

    async fn replace_preferences(&self, user_id: i32, genre_ids: &[i64]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if !genre_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO user_preferences (user_id, genre_id)
                SELECT $1, unnest($2::bigint[])
                "#,
            )
            .bind(user_id)
            .bind(genre_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(user_id, genres = genre_ids.len(), "Preferences replaced");

        Ok(())
    }

    async fn upsert_rating(
        &self,
        user_id: i32,
        item_id: i64,
        is_show: bool,
        score: f64,
    ) -> AppResult<()> {
        // The conflict target matches the table's primary key, which
        // does not include is_show; see migrations/0001_create_users.sql
        sqlx::query(
            r#"
            INSERT INTO user_ratings (user_id, item_id, is_show, score, rated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id, item_id)
            DO UPDATE SET is_show = EXCLUDED.is_show,
                          score = EXCLUDED.score,
                          rated_at = EXCLUDED.rated_at
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .bind(is_show)
        .bind(score)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id, item_id, score, "Rating stored");

        Ok(())
    }

    async fn ratings_for_user(&self, user_id: i32) -> AppResult<Vec<UserRating>> {
        let ratings = sqlx::query_as::<_, UserRating>(
            r#"
            SELECT user_id, item_id, is_show, score, rated_at
            FROM user_ratings
            WHERE user_id = $1
            ORDER BY rated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn top_rated_excluding(
        &self,
        user_id: i32,
        min_score: f64,
        limit: i64,
    ) -> AppResult<Vec<TopRatedItem>> {
        let items = sqlx::query_as::<_, TopRatedItem>(
            r#"
            SELECT item_id, is_show, AVG(score) AS average_score
            FROM user_ratings
            WHERE user_id <> $1
            GROUP BY item_id, is_show
            HAVING AVG(score) >= $2
            ORDER BY average_score DESC, item_id ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(min_score)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
