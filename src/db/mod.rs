pub mod memory;
pub mod postgres;
pub mod redis;

use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::identity::CurrentUser,
    models::{FeedbackEntry, KeyMetrics, Rating, UserActivity, WatchlistItem},
};

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;

/// Persistence for everything users create: ratings, watchlists and feedback
///
/// The user accounts themselves belong to the identity service; stores only
/// read them (for usernames and user counts). Inputs are validated by the
/// callers in `services::user_library`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserDataStore: Send + Sync {
    /// Inserts or updates the user's rating for a movie
    async fn rate_movie(&self, user: &CurrentUser, movie_id: i64, rating: f64) -> AppResult<Rating>;

    /// The user's ratings, newest first
    async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>>;

    /// Fails with `NotFound` if the user never rated the movie
    async fn delete_rating(&self, user_id: Uuid, movie_id: i64) -> AppResult<()>;

    /// Adds a movie to the watchlist
    ///
    /// Returns the stored item and whether it was newly added. A movie already
    /// on the list is returned unchanged.
    async fn add_to_watchlist(
        &self,
        user: &CurrentUser,
        movie_id: i64,
        movie_title: &str,
    ) -> AppResult<(WatchlistItem, bool)>;

    /// The user's watchlist, most recently added first
    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistItem>>;

    /// Fails with `NotFound` if the item does not exist or belongs to someone else
    async fn remove_from_watchlist(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()>;

    async fn submit_feedback(&self, user: &CurrentUser, text: &str) -> AppResult<FeedbackEntry>;

    async fn key_metrics(&self) -> AppResult<KeyMetrics>;

    /// `(movie_id, rating_count)` for the most rated movies, highest count first
    async fn rating_counts(&self, limit: usize) -> AppResult<Vec<(i64, i64)>>;

    /// Users with the most ratings, highest count first
    async fn user_activity(&self, limit: usize) -> AppResult<Vec<UserActivity>>;

    /// All feedback, newest first
    async fn all_feedback(&self) -> AppResult<Vec<FeedbackEntry>>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
