use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::UserDataStore,
    error::{AppError, AppResult},
    middleware::identity::CurrentUser,
    models::{FeedbackEntry, KeyMetrics, Rating, UserActivity, WatchlistItem},
};

/// Process-local user data, used when no database is configured and in tests
///
/// Records are kept in insertion order, so reversing a list gives newest first.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Users seen so far and their usernames, if the gateway supplied one
    users: HashMap<Uuid, Option<String>>,
    ratings: Vec<Rating>,
    watchlist: Vec<WatchlistItem>,
    feedback: Vec<FeedbackEntry>,
}

impl MemoryStoreInner {
    fn remember(&mut self, user: &CurrentUser) {
        let entry = self.users.entry(user.id).or_insert(None);
        if user.username.is_some() {
            *entry = user.username.clone();
        }
    }

    fn display_name(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .cloned()
            .flatten()
            .unwrap_or_else(|| user_id.to_string())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDataStore for MemoryStore {
    async fn rate_movie(&self, user: &CurrentUser, movie_id: i64, rating: f64) -> AppResult<Rating> {
        let mut inner = self.inner.write().await;
        inner.remember(user);

        if let Some(existing) = inner
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user.id && r.movie_id == movie_id)
        {
            existing.rating = rating;
            return Ok(existing.clone());
        }

        let fresh = Rating::new(user.id, movie_id, rating);
        inner.ratings.push(fresh.clone());
        Ok(fresh)
    }

    async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_rating(&self, user_id: Uuid, movie_id: i64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let before = inner.ratings.len();
        inner
            .ratings
            .retain(|r| !(r.user_id == user_id && r.movie_id == movie_id));

        if inner.ratings.len() == before {
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
        let mut inner = self.inner.write().await;
        inner.remember(user);

        if let Some(existing) = inner
            .watchlist
            .iter()
            .find(|w| w.user_id == user.id && w.movie_id == movie_id)
        {
            return Ok((existing.clone(), false));
        }

        let item = WatchlistItem::new(user.id, movie_id, movie_title.to_string());
        inner.watchlist.push(item.clone());
        Ok((item, true))
    }

    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistItem>> {
        let inner = self.inner.read().await;
        Ok(inner
            .watchlist
            .iter()
            .rev()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let position = inner
            .watchlist
            .iter()
            .position(|w| w.id == item_id && w.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Watchlist item {} not found", item_id)))?;

        inner.watchlist.remove(position);
        Ok(())
    }

    async fn submit_feedback(&self, user: &CurrentUser, text: &str) -> AppResult<FeedbackEntry> {
        let mut inner = self.inner.write().await;
        inner.remember(user);

        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            user_id: user.id,
            username: inner.users.get(&user.id).cloned().flatten(),
            feedback_text: text.to_string(),
            submitted_at: Utc::now(),
        };
        inner.feedback.push(entry.clone());
        Ok(entry)
    }

    async fn key_metrics(&self) -> AppResult<KeyMetrics> {
        let inner = self.inner.read().await;
        Ok(KeyMetrics {
            total_users: inner.users.len() as i64,
            total_ratings: inner.ratings.len() as i64,
            total_feedback: inner.feedback.len() as i64,
        })
    }

    async fn rating_counts(&self, limit: usize) -> AppResult<Vec<(i64, i64)>> {
        let inner = self.inner.read().await;

        let mut counts: HashMap<i64, i64> = HashMap::new();
        for rating in &inner.ratings {
            *counts.entry(rating.movie_id).or_default() += 1;
        }

        let mut counts: Vec<(i64, i64)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts.truncate(limit);
        Ok(counts)
    }

    async fn user_activity(&self, limit: usize) -> AppResult<Vec<UserActivity>> {
        let inner = self.inner.read().await;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for rating in &inner.ratings {
            *counts.entry(inner.display_name(rating.user_id)).or_default() += 1;
        }

        let mut activity: Vec<UserActivity> = counts
            .into_iter()
            .map(|(username, ratings_submitted)| UserActivity {
                username,
                ratings_submitted,
            })
            .collect();
        activity.sort_by(|a, b| {
            b.ratings_submitted
                .cmp(&a.ratings_submitted)
                .then_with(|| a.username.cmp(&b.username))
        });
        activity.truncate(limit);
        Ok(activity)
    }

    async fn all_feedback(&self) -> AppResult<Vec<FeedbackEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .feedback
            .iter()
            .rev()
            .map(|f| FeedbackEntry {
                username: inner.users.get(&f.user_id).cloned().flatten(),
                ..f.clone()
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: Some(name.to_string()),
            is_admin: false,
        }
    }

    #[test]
    fn test_empty_store_aggregates() {
        let store = MemoryStore::new();

        let metrics = tokio_test::block_on(store.key_metrics()).unwrap();
        assert_eq!(metrics, KeyMetrics::default());
        assert!(tokio_test::block_on(store.rating_counts(10)).unwrap().is_empty());
        assert!(tokio_test::block_on(store.all_feedback()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_movie_upserts() {
        let store = MemoryStore::new();
        let alice = user("alice");

        let first = store.rate_movie(&alice, 603, 6.0).await.unwrap();
        let second = store.rate_movie(&alice, 603, 9.0).await.unwrap();

        assert_eq!(first.id, second.id);
        let ratings = store.list_ratings(alice.id).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].rating, 9.0);
    }

    #[tokio::test]
    async fn test_list_ratings_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let alice = user("alice");
        let bob = user("bob");

        store.rate_movie(&alice, 1, 5.0).await.unwrap();
        store.rate_movie(&bob, 2, 5.0).await.unwrap();
        store.rate_movie(&alice, 3, 5.0).await.unwrap();

        let ids: Vec<i64> = store
            .list_ratings(alice.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.movie_id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_delete_rating() {
        let store = MemoryStore::new();
        let alice = user("alice");
        store.rate_movie(&alice, 1, 5.0).await.unwrap();

        store.delete_rating(alice.id, 1).await.unwrap();
        assert!(store.list_ratings(alice.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_rating(alice.id, 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_watchlist_has_no_duplicates() {
        let store = MemoryStore::new();
        let alice = user("alice");

        let (first, added) = store.add_to_watchlist(&alice, 603, "The Matrix").await.unwrap();
        assert!(added);
        let (second, added) = store.add_to_watchlist(&alice, 603, "The Matrix").await.unwrap();
        assert!(!added);
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_watchlist(alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_from_watchlist_checks_owner() {
        let store = MemoryStore::new();
        let alice = user("alice");
        let bob = user("bob");
        let (item, _) = store.add_to_watchlist(&alice, 603, "The Matrix").await.unwrap();

        assert!(matches!(
            store.remove_from_watchlist(bob.id, item.id).await,
            Err(AppError::NotFound(_))
        ));
        store.remove_from_watchlist(alice.id, item.id).await.unwrap();
        assert!(store.list_watchlist(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_aggregates() {
        let store = MemoryStore::new();
        let alice = user("alice");
        let bob = user("bob");

        store.rate_movie(&alice, 1, 8.0).await.unwrap();
        store.rate_movie(&alice, 2, 7.0).await.unwrap();
        store.rate_movie(&bob, 2, 4.0).await.unwrap();
        store.submit_feedback(&bob, "More horror please").await.unwrap();
        store.submit_feedback(&alice, "Love it").await.unwrap();

        let metrics = store.key_metrics().await.unwrap();
        assert_eq!(
            metrics,
            KeyMetrics {
                total_users: 2,
                total_ratings: 3,
                total_feedback: 2
            }
        );

        assert_eq!(store.rating_counts(10).await.unwrap(), vec![(2, 2), (1, 1)]);
        assert_eq!(store.rating_counts(1).await.unwrap(), vec![(2, 2)]);

        let activity = store.user_activity(10).await.unwrap();
        assert_eq!(activity[0].username, "alice");
        assert_eq!(activity[0].ratings_submitted, 2);
        assert_eq!(activity[1].username, "bob");

        let feedback = store.all_feedback().await.unwrap();
        assert_eq!(feedback[0].feedback_text, "Love it");
        assert_eq!(feedback[1].username.as_deref(), Some("bob"));
    }
}
