//! The Movie Database (TMDB) metadata provider
//!
//! One endpoint covers everything the app shows about a movie:
//! `GET /3/movie/{id}?append_to_response=videos` returns the poster path,
//! overview, vote average, release date and the video list the trailer is
//! picked from. Responses are cached per movie id when Redis is configured.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MovieDetails, TmdbMovie},
    services::providers::{MetadataEnricher, PLACEHOLDER_POSTER_URL, POSTER_ERROR_URL},
};

const MOVIE_CACHE_TTL: u64 = 86400; // 1 day
const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
    cache: Option<Cache>,
}

impl TmdbProvider {
    /// Creates a provider whose HTTP calls give up after `timeout`
    pub fn new(
        cache: Option<Cache>,
        api_key: String,
        api_url: String,
        image_base_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// Full movie record, from cache when possible
    async fn fetch_movie(&self, movie_id: i64) -> AppResult<TmdbMovie> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::TmdbMovie(movie_id),
                MOVIE_CACHE_TTL,
                self.request_movie(movie_id)
            ),
            None => self.request_movie(movie_id).await,
        }
    }

    async fn request_movie(&self, movie_id: i64) -> AppResult<TmdbMovie> {
        let url = format!("{}/3/movie/{}", self.api_url, movie_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", LANGUAGE),
                ("append_to_response", "videos"),
            ])
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                AppError::EnrichmentUnavailable(format!("TMDB movie {}: {}", movie_id, reason))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EnrichmentUnavailable(format!(
                "TMDB API returned status {} for movie {}: {}",
                status, movie_id, body
            )));
        }

        let response_text = response.text().await?;
        tracing::debug!(movie_id, response = %response_text, "Raw TMDB API response");

        let movie: TmdbMovie = serde_json::from_str(&response_text).map_err(|e| {
            AppError::EnrichmentUnavailable(format!(
                "Failed to parse TMDB response for movie {}: {}",
                movie_id, e
            ))
        })?;

        tracing::debug!(
            movie_id,
            has_poster = movie.poster_path.is_some(),
            provider = "tmdb",
            "Movie metadata fetched"
        );

        Ok(movie)
    }

    fn poster_url(&self, movie: &TmdbMovie) -> String {
        match movie.poster_path.as_deref().map(|p| p.trim_start_matches('/')) {
            Some(path) if !path.is_empty() => format!("{}/{}", self.image_base_url, path),
            _ => PLACEHOLDER_POSTER_URL.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl MetadataEnricher for TmdbProvider {
    async fn fetch_poster(&self, movie_id: i64) -> String {
        match self.fetch_movie(movie_id).await {
            Ok(movie) => self.poster_url(&movie),
            Err(e) => {
                tracing::warn!(movie_id, error = %e, "Poster lookup failed, using placeholder");
                POSTER_ERROR_URL.to_string()
            }
        }
    }

    async fn fetch_details(&self, movie_id: i64) -> MovieDetails {
        match self.fetch_movie(movie_id).await {
            Ok(movie) => MovieDetails::from(movie),
            Err(e) => {
                tracing::warn!(movie_id, error = %e, "Details lookup failed, using placeholder");
                MovieDetails::unavailable()
            }
        }
    }

    async fn enrich(&self, movie_id: i64) -> (String, MovieDetails) {
        match self.fetch_movie(movie_id).await {
            Ok(movie) => {
                let poster = self.poster_url(&movie);
                (poster, MovieDetails::from(movie))
            }
            Err(e) => {
                tracing::warn!(movie_id, error = %e, "Enrichment failed, using placeholders");
                (POSTER_ERROR_URL.to_string(), MovieDetails::unavailable())
            }
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    const TEST_KEY: &str = "test_key";

    /// Canned TMDB responses keyed by movie id
    async fn movie_handler(
        Path(movie_id): Path<i64>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if params.get("api_key").map(String::as_str) != Some(TEST_KEY) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if params.get("append_to_response").map(String::as_str) != Some("videos") {
            return StatusCode::BAD_REQUEST.into_response();
        }

        match movie_id {
            27205 => Json(json!({
                "poster_path": "/inception.jpg",
                "overview": "Cobb steals secrets from dreams.",
                "vote_average": 8.4,
                "release_date": "2010-07-15",
                "videos": {"results": [
                    {"type": "Featurette", "site": "YouTube", "key": "feat"},
                    {"type": "Trailer", "site": "YouTube", "key": "YoHD9XEInc0"}
                ]}
            }))
            .into_response(),
            2 => Json(json!({
                "poster_path": null,
                "overview": "Nothing to look at."
            }))
            .into_response(),
            3 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            4 => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({})).into_response()
            }
            5 => "not json".into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_fake_tmdb() -> String {
        let app = Router::new().route("/3/movie/:movie_id", get(movie_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(api_url: String) -> TmdbProvider {
        TmdbProvider::new(
            None,
            TEST_KEY.to_string(),
            api_url,
            "https://image.tmdb.org/t/p/w500/".to_string(),
            Duration::from_millis(300),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_poster() {
        let provider = provider(spawn_fake_tmdb().await);
        assert_eq!(
            provider.fetch_poster(27205).await,
            "https://image.tmdb.org/t/p/w500/inception.jpg"
        );
    }

    #[tokio::test]
    async fn test_fetch_poster_missing_path_uses_placeholder() {
        let provider = provider(spawn_fake_tmdb().await);
        assert_eq!(provider.fetch_poster(2).await, PLACEHOLDER_POSTER_URL);
    }

    #[tokio::test]
    async fn test_fetch_poster_error_status_uses_error_placeholder() {
        let provider = provider(spawn_fake_tmdb().await);
        assert_eq!(provider.fetch_poster(3).await, POSTER_ERROR_URL);
        assert_eq!(provider.fetch_poster(404).await, POSTER_ERROR_URL);
    }

    #[tokio::test]
    async fn test_fetch_details() {
        let provider = provider(spawn_fake_tmdb().await);
        let details = provider.fetch_details(27205).await;
        assert_eq!(details.overview, "Cobb steals secrets from dreams.");
        assert_eq!(details.vote_average, 8.4);
        assert_eq!(details.release_date, "2010-07-15");
        assert_eq!(details.trailer_key, Some("YoHD9XEInc0".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_details_sparse_record() {
        let provider = provider(spawn_fake_tmdb().await);
        let details = provider.fetch_details(2).await;
        assert_eq!(details.overview, "Nothing to look at.");
        assert_eq!(details.vote_average, 0.0);
        assert_eq!(details.release_date, "N/A");
        assert_eq!(details.trailer_key, None);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_placeholders() {
        let provider = provider(spawn_fake_tmdb().await);
        let (poster, details) = provider.enrich(4).await;
        assert_eq!(poster, POSTER_ERROR_URL);
        assert_eq!(details, MovieDetails::unavailable());
    }

    #[tokio::test]
    async fn test_malformed_response_degrades_to_placeholders() {
        let provider = provider(spawn_fake_tmdb().await);
        assert_eq!(provider.fetch_details(5).await, MovieDetails::unavailable());
    }

    #[tokio::test]
    async fn test_unreachable_host_degrades_to_placeholders() {
        let provider = provider("http://127.0.0.1:1".to_string());
        let (poster, details) = provider.enrich(27205).await;
        assert_eq!(poster, POSTER_ERROR_URL);
        assert_eq!(details.vote_average, 0.0);
        assert_eq!(details.trailer_key, None);
    }

    #[tokio::test]
    async fn test_enrich_single_call() {
        let provider = provider(spawn_fake_tmdb().await);
        let (poster, details) = provider.enrich(27205).await;
        assert!(poster.ends_with("/inception.jpg"));
        assert_eq!(details.trailer_key, Some("YoHD9XEInc0".to_string()));
    }

    #[test]
    fn test_poster_url_strips_slashes() {
        let provider = provider("http://unused".to_string());
        let movie = TmdbMovie {
            poster_path: Some("/x.jpg".to_string()),
            ..Default::default()
        };
        assert_eq!(provider.poster_url(&movie), "https://image.tmdb.org/t/p/w500/x.jpg");

        let empty = TmdbMovie {
            poster_path: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(provider.poster_url(&empty), PLACEHOLDER_POSTER_URL);
    }
}
