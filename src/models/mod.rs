use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

pub mod user_data;

pub use user_data::{
    FeedbackEntry, KeyMetrics, MostRatedMovie, Rating, UserActivity, WatchlistItem,
};

/// Video hosting sites whose trailers the presentation layer can embed
pub const TRAILER_SITES: &[&str] = &["YouTube"];

const NO_OVERVIEW: &str = "No overview available.";
const OVERVIEW_ERROR: &str = "Error fetching details.";
const NO_RELEASE_DATE: &str = "N/A";

/// A movie from the precomputed catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    #[serde(rename = "movie_id", alias = "id")]
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_genres")]
    pub genres: BTreeSet<String>,
}

impl Movie {
    pub fn new<I, S>(id: i64, title: impl Into<String>, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            title: title.into(),
            genres: genres.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the movie is tagged with `genre`.
    ///
    /// Stored genres are space-free (`ScienceFiction`), so the display form
    /// ("Science Fiction") matches as well.
    pub fn has_genre(&self, genre: &str) -> bool {
        let wanted: String = genre.split_whitespace().collect();
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(&wanted))
    }
}

/// Genres arrive either as a list or as one `|`/space separated string
fn deserialize_genres<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum GenreField {
        List(Vec<String>),
        Joined(String),
    }

    let genres = match GenreField::deserialize(deserializer)? {
        GenreField::List(list) => list,
        GenreField::Joined(joined) => joined
            .split(|c: char| c == '|' || c.is_whitespace())
            .map(str::to_string)
            .collect(),
    };

    Ok(genres
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect())
}

/// Display metadata for a movie, sourced from TMDB
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub overview: String,
    pub vote_average: f64,
    pub release_date: String,
    pub trailer_key: Option<String>,
}

impl MovieDetails {
    /// Placeholder details used when enrichment fails
    pub fn unavailable() -> Self {
        Self {
            overview: OVERVIEW_ERROR.to_string(),
            vote_average: 0.0,
            release_date: NO_RELEASE_DATE.to_string(),
            trailer_key: None,
        }
    }
}

/// One recommended movie, most similar first in a result list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub movie_id: i64,
    pub title: String,
    pub poster_url: String,
    pub details: MovieDetails,
}

/// A catalog entry with its poster, returned by genre browse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieCard {
    pub movie_id: i64,
    pub title: String,
    pub genres: BTreeSet<String>,
    pub poster_url: String,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw response from GET /3/movie/{id}
///
/// Every field is optional: TMDB omits or nulls fields for sparse entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TmdbMovie {
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Present only with `append_to_response=videos`
    #[serde(default)]
    pub videos: Option<TmdbVideos>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TmdbVideo {
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub key: String,
}

impl TmdbMovie {
    /// First trailer hosted on a recognized site
    pub fn trailer_key(&self) -> Option<String> {
        self.videos
            .as_ref()?
            .results
            .iter()
            .find(|v| v.video_type == "Trailer" && TRAILER_SITES.contains(&v.site.as_str()))
            .map(|v| v.key.clone())
    }
}

impl From<TmdbMovie> for MovieDetails {
    fn from(movie: TmdbMovie) -> Self {
        let trailer_key = movie.trailer_key();

        MovieDetails {
            overview: movie.overview.unwrap_or_else(|| NO_OVERVIEW.to_string()),
            vote_average: movie.vote_average.unwrap_or(0.0),
            release_date: movie
                .release_date
                .unwrap_or_else(|| NO_RELEASE_DATE.to_string()),
            trailer_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_deserialization_with_genre_list() {
        let json = r#"{"movie_id": 19995, "title": "Avatar", "genres": ["Action", "Adventure"]}"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 19995);
        assert_eq!(movie.title, "Avatar");
        assert!(movie.genres.contains("Action"));
        assert!(movie.genres.contains("Adventure"));
    }

    #[test]
    fn test_movie_deserialization_with_joined_genres_and_id_alias() {
        let json = r#"{"id": 285, "title": "Pirates", "genres": "Adventure Fantasy|Action"}"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 285);
        assert_eq!(movie.genres.len(), 3);
        assert!(movie.genres.contains("Fantasy"));
    }

    #[test]
    fn test_movie_without_genres() {
        let movie: Movie = serde_json::from_str(r#"{"movie_id": 1, "title": "Bare"}"#).unwrap();
        assert!(movie.genres.is_empty());
    }

    #[test]
    fn test_has_genre_matches_display_name() {
        let movie = Movie::new(1, "Interstellar", ["ScienceFiction", "Drama"]);
        assert!(movie.has_genre("Science Fiction"));
        assert!(movie.has_genre("drama"));
        assert!(!movie.has_genre("Comedy"));
    }

    #[test]
    fn test_tmdb_movie_to_details() {
        let json = r#"{
            "poster_path": "/abc.jpg",
            "overview": "A dream within a dream.",
            "vote_average": 8.4,
            "release_date": "2010-07-15",
            "videos": {"results": [
                {"type": "Teaser", "site": "YouTube", "key": "teaser1"},
                {"type": "Trailer", "site": "Vimeo", "key": "vimeo1"},
                {"type": "Trailer", "site": "YouTube", "key": "yt1"},
                {"type": "Trailer", "site": "YouTube", "key": "yt2"}
            ]}
        }"#;

        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        let details = MovieDetails::from(movie);
        assert_eq!(details.overview, "A dream within a dream.");
        assert_eq!(details.vote_average, 8.4);
        assert_eq!(details.release_date, "2010-07-15");
        assert_eq!(details.trailer_key, Some("yt1".to_string()));
    }

    #[test]
    fn test_tmdb_movie_missing_fields_use_defaults() {
        let movie: TmdbMovie = serde_json::from_str("{}").unwrap();
        let details = MovieDetails::from(movie);
        assert_eq!(details.overview, "No overview available.");
        assert_eq!(details.vote_average, 0.0);
        assert_eq!(details.release_date, "N/A");
        assert_eq!(details.trailer_key, None);
    }

    #[test]
    fn test_no_recognized_trailer() {
        let json = r#"{"videos": {"results": [{"type": "Clip", "site": "YouTube", "key": "c"}]}}"#;
        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.trailer_key(), None);
    }

    #[test]
    fn test_unavailable_details() {
        let details = MovieDetails::unavailable();
        assert_eq!(details.vote_average, 0.0);
        assert_eq!(details.release_date, "N/A");
        assert!(details.trailer_key.is_none());
    }
}
