//! Movie metadata provider abstraction
//!
//! Recommendations and catalog browsing only know movie ids and titles. Posters,
//! overviews, ratings and trailers come from an external movie database behind
//! this trait, so the source can be swapped (or stubbed in tests).
use crate::models::MovieDetails;

pub mod tmdb;

/// Shown when the movie database has no poster for a movie
pub const PLACEHOLDER_POSTER_URL: &str = "https://via.placeholder.com/500x750?text=No+Image";

/// Shown when the poster lookup itself failed
pub const POSTER_ERROR_URL: &str = "https://via.placeholder.com/500x750?text=Error";

/// Trait for movie metadata providers
///
/// Lookups never fail: implementations log the problem and hand back
/// placeholder values so that one bad lookup cannot sink a whole page of
/// results.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataEnricher: Send + Sync {
    /// Poster image URL, or a placeholder URL
    async fn fetch_poster(&self, movie_id: i64) -> String;

    /// Overview, rating, release date and trailer, or `MovieDetails::unavailable()`
    async fn fetch_details(&self, movie_id: i64) -> MovieDetails;

    /// Poster and details together
    ///
    /// Default implementation issues both lookups concurrently. Providers whose
    /// API returns both in one response should override it.
    async fn enrich(&self, movie_id: i64) -> (String, MovieDetails) {
        tokio::join!(self.fetch_poster(movie_id), self.fetch_details(movie_id))
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
