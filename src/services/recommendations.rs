use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieCard, MovieDetails, RecommendationResult},
    services::{
        providers::{MetadataEnricher, POSTER_ERROR_URL},
        similarity_index::SimilarityIndex,
    },
};

/// Upper bound on `k` accepted from callers
pub const MAX_RECOMMENDATIONS: usize = 20;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Deadline for each enrichment call
    pub enrichment_timeout: Duration,
    /// Maximum enrichment calls in flight for one request
    pub max_concurrency: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            enrichment_timeout: Duration::from_secs(3),
            max_concurrency: 5,
        }
    }
}

/// Generates "more like this" recommendations
///
/// Ranks neighbours from the precomputed similarity index, then decorates the
/// top K with posters and details from the metadata provider. Provider calls
/// run concurrently, each under its own deadline, and a failed call only
/// costs that movie its real artwork.
#[derive(Clone)]
pub struct RecommendationEngine {
    index: Arc<SimilarityIndex>,
    enricher: Arc<dyn MetadataEnricher>,
    settings: EngineSettings,
}

impl RecommendationEngine {
    pub fn new(
        index: Arc<SimilarityIndex>,
        enricher: Arc<dyn MetadataEnricher>,
        settings: EngineSettings,
    ) -> Self {
        tracing::info!(
            movies = index.len(),
            provider = enricher.name(),
            timeout_ms = settings.enrichment_timeout.as_millis() as u64,
            max_concurrency = settings.max_concurrency,
            "Recommendation engine ready"
        );

        Self {
            index,
            enricher,
            settings,
        }
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Up to `k` movies most similar to `title`, most similar first
    ///
    /// An unknown title yields an empty list rather than an error.
    pub async fn recommend(&self, title: &str, k: usize) -> Vec<RecommendationResult> {
        let picks = match self.similar_movies(title, k) {
            Ok(picks) => picks,
            Err(e) => {
                tracing::info!(title = %title, reason = %e, "No recommendations");
                return Vec::new();
            }
        };

        let ids: Vec<i64> = picks.iter().map(|m| m.id).collect();
        let enriched = self
            .fan_out(&ids, |enricher, id| async move { enricher.enrich(id).await }, || {
                (POSTER_ERROR_URL.to_string(), MovieDetails::unavailable())
            })
            .await;

        let results: Vec<RecommendationResult> = picks
            .into_iter()
            .zip(enriched)
            .map(|(movie, (poster_url, details))| RecommendationResult {
                movie_id: movie.id,
                title: movie.title,
                poster_url,
                details,
            })
            .collect();

        tracing::info!(title = %title, k, returned = results.len(), "Recommendations generated");

        results
    }

    /// The ranked neighbour movies for `title`, without enrichment
    pub fn similar_movies(&self, title: &str, k: usize) -> AppResult<Vec<Movie>> {
        let row = self.index.lookup_index(title)?;
        let scores = self.index.neighbor_scores(row)?;

        Ok(rank_neighbors(scores, row, k)
            .into_iter()
            .filter_map(|(i, _)| self.index.movie_at(i).cloned())
            .collect())
    }

    /// Catalog entries decorated with posters, in the given order
    pub async fn movie_cards(&self, movies: Vec<Movie>) -> Vec<MovieCard> {
        let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
        let posters = self
            .fan_out(
                &ids,
                |enricher, id| async move { enricher.fetch_poster(id).await },
                || POSTER_ERROR_URL.to_string(),
            )
            .await;

        movies
            .into_iter()
            .zip(posters)
            .map(|(movie, poster_url)| MovieCard {
                movie_id: movie.id,
                title: movie.title,
                genres: movie.genres,
                poster_url,
            })
            .collect()
    }

    /// Poster and details for a single catalog movie
    pub async fn describe(&self, movie_id: i64) -> AppResult<RecommendationResult> {
        let movie = self
            .index
            .movie_by_id(movie_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

        let mut enriched = self
            .fan_out(&[movie.id], |enricher, id| async move { enricher.enrich(id).await }, || {
                (POSTER_ERROR_URL.to_string(), MovieDetails::unavailable())
            })
            .await;
        let (poster_url, details) = enriched
            .pop()
            .unwrap_or_else(|| (POSTER_ERROR_URL.to_string(), MovieDetails::unavailable()));

        Ok(RecommendationResult {
            movie_id: movie.id,
            title: movie.title,
            poster_url,
            details,
        })
    }

    /// Runs `call` for every id on its own task and collects results in input order
    ///
    /// At most `max_concurrency` calls run at once. A call that times out or
    /// panics is replaced by `fallback()`.
    async fn fan_out<T, F, Fut>(&self, ids: &[i64], call: F, fallback: fn() -> T) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn MetadataEnricher>, i64) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        if ids.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(
            self.settings.max_concurrency.clamp(1, ids.len()),
        ));
        let timeout = self.settings.enrichment_timeout;

        let mut tasks = Vec::with_capacity(ids.len());
        for &movie_id in ids {
            let permits = permits.clone();
            let lookup = call(self.enricher.clone(), movie_id);
            let task = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                tokio::time::timeout(timeout, lookup).await
            });
            tasks.push((movie_id, task));
        }

        let mut results = Vec::with_capacity(tasks.len());
        let mut degraded = 0;

        for (movie_id, task) in tasks {
            match task.await {
                Ok(Ok(value)) => results.push(value),
                Ok(Err(_)) => {
                    let e = AppError::EnrichmentUnavailable(format!(
                        "lookup exceeded {} ms",
                        timeout.as_millis()
                    ));
                    tracing::warn!(movie_id, error = %e, "Enrichment timed out, using placeholders");
                    degraded += 1;
                    results.push(fallback());
                }
                Err(e) => {
                    tracing::error!(movie_id, error = %e, "Enrichment task join error");
                    degraded += 1;
                    results.push(fallback());
                }
            }
        }

        if degraded > 0 {
            tracing::warn!(
                success_count = results.len() - degraded,
                degraded_count = degraded,
                "Partial enrichment failure"
            );
        }

        results
    }
}

/// Orders a score row most-similar first and keeps the top `k`, excluding `self_index`
///
/// The sort is stable, so equal scores keep their column order. NaN scores
/// rank below every number.
pub fn rank_neighbors(
    mut scores: Vec<(usize, f64)>,
    self_index: usize,
    k: usize,
) -> Vec<(usize, f64)> {
    scores.sort_by(|a, b| descending(a.1, b.1));
    scores
        .into_iter()
        .filter(|(i, _)| *i != self_index)
        .take(k)
        .collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
