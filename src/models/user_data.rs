use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

/// A user's score for one movie. One per user and movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: i64,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: Uuid, movie_id: i64, rating: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            rating,
            created_at: Utc::now(),
        }
    }
}

/// Checks a submitted rating against the 1-10 scale
pub fn validate_rating(rating: f64) -> AppResult<f64> {
    if rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(AppError::InvalidInput(format!(
            "Rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: i64,
    pub movie_title: String,
    pub added_at: DateTime<Utc>,
}

impl WatchlistItem {
    pub fn new(user_id: Uuid, movie_id: i64, movie_title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            movie_title,
            added_at: Utc::now(),
        }
    }
}

/// Feedback as shown to administrators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Absent when the identity service has no record of the user
    pub username: Option<String>,
    pub feedback_text: String,
    pub submitted_at: DateTime<Utc>,
}

/// Headline counts for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyMetrics {
    pub total_users: i64,
    pub total_ratings: i64,
    pub total_feedback: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MostRatedMovie {
    pub movie_id: i64,
    /// Joined from the catalog; `None` for ids the catalog does not know
    pub title: Option<String>,
    pub rating_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct UserActivity {
    pub username: String,
    pub ratings_submitted: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating_bounds() {
        assert_eq!(validate_rating(1.0).unwrap(), 1.0);
        assert_eq!(validate_rating(10.0).unwrap(), 10.0);
        assert_eq!(validate_rating(7.5).unwrap(), 7.5);
    }

    #[test]
    fn test_validate_rating_rejects_out_of_range() {
        assert!(matches!(validate_rating(0.0), Err(AppError::InvalidInput(_))));
        assert!(matches!(validate_rating(11.0), Err(AppError::InvalidInput(_))));
        assert!(matches!(
            validate_rating(f64::NAN),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_new_watchlist_item() {
        let user_id = Uuid::new_v4();
        let item = WatchlistItem::new(user_id, 603, "The Matrix".to_string());
        assert_eq!(item.user_id, user_id);
        assert_eq!(item.movie_id, 603);
        assert_eq!(item.movie_title, "The Matrix");
    }
}
