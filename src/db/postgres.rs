use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::UserDataStore,
    error::{AppError, AppResult},
    middleware::identity::CurrentUser,
    models::{FeedbackEntry, KeyMetrics, Rating, UserActivity, WatchlistItem},
};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

// Ids are VARCHAR(36) and timestamps are UTC `TIMESTAMP` without time zone,
// so reads cast back to UUID / TIMESTAMPTZ and writes bind strings and naive times.
const RATING_COLUMNS: &str = "id::uuid AS id, user_id::uuid AS user_id, \
     movie_id::BIGINT AS movie_id, rating, created_at AT TIME ZONE 'UTC' AS created_at";

const WATCHLIST_COLUMNS: &str = "id::uuid AS id, user_id::uuid AS user_id, \
     movie_id::BIGINT AS movie_id, movie_title, added_at AT TIME ZONE 'UTC' AS added_at";

/// User data in PostgreSQL
///
/// Expects the `users`, `ratings`, `watchlist_items` and `feedback` tables to
/// exist already, with `VARCHAR(36)` ids, an integer `movie_id` and
/// `TIMESTAMP` columns holding UTC. The schema is owned by the deployment,
/// not by this service.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serializes writers for one (user, movie) pair until the transaction ends
async fn lock_user_movie(
    tx: &mut Transaction<'_, Postgres>,
    scope: &str,
    user_id: Uuid,
    movie_id: i64,
) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("{}:{}:{}", scope, user_id, movie_id))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl UserDataStore for PgStore {
    async fn rate_movie(&self, user: &CurrentUser, movie_id: i64, rating: f64) -> AppResult<Rating> {
        let mut tx = self.pool.begin().await?;
        lock_user_movie(&mut tx, "ratings", user.id, movie_id).await?;

        let existing: Option<Rating> = sqlx::query_as(&format!(
            "SELECT {} FROM ratings WHERE user_id = $1 AND movie_id = $2 LIMIT 1",
            RATING_COLUMNS
        ))
        .bind(user.id.to_string())
        .bind(movie_id)
        .fetch_optional(&mut *tx)
        .await?;

        let stored = match existing {
            Some(mut current) => {
                sqlx::query("UPDATE ratings SET rating = $1 WHERE id = $2")
                    .bind(rating)
                    .bind(current.id.to_string())
                    .execute(&mut *tx)
                    .await?;
                current.rating = rating;
                current
            }
            None => {
                let fresh = Rating::new(user.id, movie_id, rating);
                sqlx::query(
                    r#"
                    INSERT INTO ratings (id, user_id, movie_id, rating, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(fresh.id.to_string())
                .bind(fresh.user_id.to_string())
                .bind(fresh.movie_id)
                .bind(fresh.rating)
                .bind(fresh.created_at.naive_utc())
                .execute(&mut *tx)
                .await?;
                fresh
            }
        };

        tx.commit().await?;
        Ok(stored)
    }

    async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as(&format!(
            "SELECT {} FROM ratings WHERE user_id = $1 ORDER BY created_at DESC",
            RATING_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn delete_rating(&self, user_id: Uuid, movie_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM ratings WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id.to_string())
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No rating for movie {}",
                movie_id
            )));
        }
        Ok(())
    }

    async fn add_to_watchlist(
        &self,
        user: &CurrentUser,
        movie_id: i64,
        movie_title: &str,
    ) -> AppResult<(WatchlistItem, bool)> {
        let mut tx = self.pool.begin().await?;
        lock_user_movie(&mut tx, "watchlist", user.id, movie_id).await?;

        let existing: Option<WatchlistItem> = sqlx::query_as(&format!(
            "SELECT {} FROM watchlist_items WHERE user_id = $1 AND movie_id = $2 LIMIT 1",
            WATCHLIST_COLUMNS
        ))
        .bind(user.id.to_string())
        .bind(movie_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(item) = existing {
            tx.commit().await?;
            return Ok((item, false));
        }

        let item = WatchlistItem::new(user.id, movie_id, movie_title.to_string());
        sqlx::query(
            r#"
            INSERT INTO watchlist_items (id, user_id, movie_id, movie_title, added_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.user_id.to_string())
        .bind(item.movie_id)
        .bind(&item.movie_title)
        .bind(item.added_at.naive_utc())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((item, true))
    }

    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistItem>> {
        let items = sqlx::query_as(&format!(
            "SELECT {} FROM watchlist_items WHERE user_id = $1 ORDER BY added_at DESC",
            WATCHLIST_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM watchlist_items WHERE id = $1 AND user_id = $2")
            .bind(item_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Watchlist item {} not found",
                item_id
            )));
        }
        Ok(())
    }

    async fn submit_feedback(&self, user: &CurrentUser, text: &str) -> AppResult<FeedbackEntry> {
        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            user_id: user.id,
            username: user.username.clone(),
            feedback_text: text.to_string(),
            submitted_at: chrono::Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO feedback (id, user_id, feedback_text, submitted_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(&entry.feedback_text)
        .bind(entry.submitted_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn key_metrics(&self) -> AppResult<KeyMetrics> {
        let (total_users, total_ratings, total_feedback): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM ratings),
                (SELECT COUNT(*) FROM feedback)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(KeyMetrics {
            total_users,
            total_ratings,
            total_feedback,
        })
    }

    async fn rating_counts(&self, limit: usize) -> AppResult<Vec<(i64, i64)>> {
        let counts = sqlx::query_as(
            r#"
            SELECT movie_id::BIGINT AS movie_id, COUNT(*) AS rating_count
            FROM ratings
            GROUP BY movie_id
            ORDER BY rating_count DESC, movie_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn user_activity(&self, limit: usize) -> AppResult<Vec<UserActivity>> {
        let activity = sqlx::query_as(
            r#"
            SELECT u.username AS username, COUNT(r.id) AS ratings_submitted
            FROM users u
            JOIN ratings r ON r.user_id = u.id
            GROUP BY u.username
            ORDER BY ratings_submitted DESC, u.username ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(activity)
    }

    async fn all_feedback(&self) -> AppResult<Vec<FeedbackEntry>> {
        let entries = sqlx::query_as(
            r#"
            SELECT f.id::uuid AS id, f.user_id::uuid AS user_id, u.username,
                   f.feedback_text, f.submitted_at AT TIME ZONE 'UTC' AS submitted_at
            FROM feedback f
            LEFT JOIN users u ON u.id = f.user_id
            ORDER BY f.submitted_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
