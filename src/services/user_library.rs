use serde::Serialize;

use crate::{
    db::UserDataStore,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{user_data::validate_rating, FeedbackEntry, Movie, Rating, WatchlistItem},
    services::similarity_index::SimilarityIndex,
};

const MAX_FEEDBACK_CHARS: usize = 5000;

/// A rating together with the rated movie's title
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatedMovie {
    #[serde(flatten)]
    pub rating: Rating,
    /// `None` when the movie has left the catalog
    pub title: Option<String>,
}

fn catalog_movie(index: &SimilarityIndex, movie_id: i64) -> AppResult<&Movie> {
    index
        .movie_by_id(movie_id)
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))
}

/// Rates a catalog movie on the 1-10 scale, replacing any earlier rating
pub async fn rate_movie(
    store: &dyn UserDataStore,
    index: &SimilarityIndex,
    user: &CurrentUser,
    movie_id: i64,
    rating: f64,
) -> AppResult<Rating> {
    let rating = validate_rating(rating)?;
    let movie = catalog_movie(index, movie_id)?;

    let stored = store.rate_movie(user, movie.id, rating).await?;

    tracing::info!(
        user_id = %user.id,
        movie_id,
        rating,
        "Movie rated"
    );

    Ok(stored)
}

pub async fn list_ratings(
    store: &dyn UserDataStore,
    index: &SimilarityIndex,
    user: &CurrentUser,
) -> AppResult<Vec<RatedMovie>> {
    let ratings = store.list_ratings(user.id).await?;

    Ok(ratings
        .into_iter()
        .map(|rating| RatedMovie {
            title: index.movie_by_id(rating.movie_id).map(|m| m.title.clone()),
            rating,
        })
        .collect())
}

/// Adds a catalog movie to the watchlist; `false` if it was already there
pub async fn add_to_watchlist(
    store: &dyn UserDataStore,
    index: &SimilarityIndex,
    user: &CurrentUser,
    movie_id: i64,
) -> AppResult<(WatchlistItem, bool)> {
    let movie = catalog_movie(index, movie_id)?;
    let (item, added) = store.add_to_watchlist(user, movie.id, &movie.title).await?;

    tracing::info!(
        user_id = %user.id,
        movie_id,
        added,
        "Watchlist updated"
    );

    Ok((item, added))
}

pub async fn submit_feedback(
    store: &dyn UserDataStore,
    user: &CurrentUser,
    text: &str,
) -> AppResult<FeedbackEntry> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput(
            "Feedback cannot be empty".to_string(),
        ));
    }
    if text.chars().count() > MAX_FEEDBACK_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Feedback is limited to {} characters",
            MAX_FEEDBACK_CHARS
        )));
    }

    let entry = store.submit_feedback(user, text).await?;
    tracing::info!(user_id = %user.id, feedback_id = %entry.id, "Feedback submitted");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockUserDataStore};
    use crate::services::similarity_index::tests::sample_index;
    use uuid::Uuid;

    fn alice() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: Some("alice".to_string()),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_rate_movie_validates_before_storing() {
        let mut store = MockUserDataStore::new();
        store.expect_rate_movie().never();
        let index = sample_index();

        let err = rate_movie(&store, &index, &alice(), 10, 11.0).await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));

        let err = rate_movie(&store, &index, &alice(), 999, 5.0).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_ratings_joins_titles() {
        let store = MemoryStore::new();
        let index = sample_index();
        let user = alice();

        rate_movie(&store, &index, &user, 20, 8.0).await.unwrap();
        let rated = list_ratings(&store, &index, &user).await.unwrap();
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].title.as_deref(), Some("B"));
        assert_eq!(rated[0].rating.rating, 8.0);
    }

    #[tokio::test]
    async fn test_add_to_watchlist_uses_catalog_title() {
        let store = MemoryStore::new();
        let index = sample_index();
        let user = alice();

        let (item, added) = add_to_watchlist(&store, &index, &user, 30).await.unwrap();
        assert!(added);
        assert_eq!(item.movie_title, "C");

        assert!(matches!(
            add_to_watchlist(&store, &index, &user, 31).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_feedback_rejects_blank() {
        let mut store = MockUserDataStore::new();
        store.expect_submit_feedback().never();

        assert!(matches!(
            submit_feedback(&store, &alice(), "   \n").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_feedback_trims() {
        let store = MemoryStore::new();
        let entry = submit_feedback(&store, &alice(), "  Great picks!  ").await.unwrap();
        assert_eq!(entry.feedback_text, "Great picks!");
        assert_eq!(entry.username.as_deref(), Some("alice"));
    }
}
