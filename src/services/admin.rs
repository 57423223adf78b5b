use serde::Serialize;

use crate::{
    db::UserDataStore,
    error::AppResult,
    models::{FeedbackEntry, KeyMetrics, MostRatedMovie, UserActivity},
    services::similarity_index::SimilarityIndex,
};

/// Rows shown in each admin leaderboard
pub const LEADERBOARD_SIZE: usize = 10;

/// Usage overview for administrators
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminDashboard {
    pub key_metrics: KeyMetrics,
    pub most_rated_movies: Vec<MostRatedMovie>,
    pub most_active_users: Vec<UserActivity>,
}

/// Gathers headline counts and the two leaderboards
pub async fn dashboard(
    store: &dyn UserDataStore,
    index: &SimilarityIndex,
) -> AppResult<AdminDashboard> {
    let (key_metrics, counts, most_active_users) = tokio::try_join!(
        store.key_metrics(),
        store.rating_counts(LEADERBOARD_SIZE),
        store.user_activity(LEADERBOARD_SIZE),
    )?;

    let most_rated_movies = counts
        .into_iter()
        .map(|(movie_id, rating_count)| MostRatedMovie {
            movie_id,
            title: index.movie_by_id(movie_id).map(|m| m.title.clone()),
            rating_count,
        })
        .collect();

    tracing::debug!(
        total_users = key_metrics.total_users,
        total_ratings = key_metrics.total_ratings,
        "Admin dashboard assembled"
    );

    Ok(AdminDashboard {
        key_metrics,
        most_rated_movies,
        most_active_users,
    })
}

pub async fn all_feedback(store: &dyn UserDataStore) -> AppResult<Vec<FeedbackEntry>> {
    store.all_feedback().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockUserDataStore;
    use crate::error::AppError;
    use crate::services::similarity_index::tests::sample_index;

    #[tokio::test]
    async fn test_dashboard_joins_titles() {
        let mut store = MockUserDataStore::new();
        store.expect_key_metrics().returning(|| {
            Ok(KeyMetrics {
                total_users: 3,
                total_ratings: 5,
                total_feedback: 1,
            })
        });
        store
            .expect_rating_counts()
            .withf(|limit| *limit == LEADERBOARD_SIZE)
            .returning(|_| Ok(vec![(20, 3), (77, 2)]));
        store.expect_user_activity().returning(|_| {
            Ok(vec![UserActivity {
                username: "alice".to_string(),
                ratings_submitted: 4,
            }])
        });

        let index = sample_index();
        let dashboard = dashboard(&store, &index).await.unwrap();

        assert_eq!(dashboard.key_metrics.total_ratings, 5);
        assert_eq!(
            dashboard.most_rated_movies,
            vec![
                MostRatedMovie {
                    movie_id: 20,
                    title: Some("B".to_string()),
                    rating_count: 3
                },
                MostRatedMovie {
                    movie_id: 77,
                    title: None,
                    rating_count: 2
                },
            ]
        );
        assert_eq!(dashboard.most_active_users[0].username, "alice");
    }

    #[tokio::test]
    async fn test_dashboard_propagates_store_errors() {
        let mut store = MockUserDataStore::new();
        store
            .expect_key_metrics()
            .returning(|| Err(AppError::Internal("store offline".to_string())));
        store.expect_rating_counts().returning(|_| Ok(vec![]));
        store.expect_user_activity().returning(|_| Ok(vec![]));

        let index = sample_index();
        assert!(dashboard(&store, &index).await.is_err());
    }
}
