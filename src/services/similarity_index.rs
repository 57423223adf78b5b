//! Precomputed content-similarity lookup.
//!
//! The movie table and the square similarity matrix are produced offline and
//! loaded once at startup. Row `i` of the matrix scores movie `i` of the table
//! against every other movie, in table order. Nothing here mutates after
//! construction, so the index is shared across handlers behind an `Arc`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
};

/// Genres offered for browsing, in display form
pub const BROWSE_GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Animation",
    "Comedy",
    "Crime",
    "Drama",
    "Fantasy",
    "Horror",
    "Science Fiction",
    "Thriller",
];

pub struct SimilarityIndex {
    movies: Vec<Movie>,
    /// Row-major `n x n` scores
    scores: Vec<f64>,
}

impl SimilarityIndex {
    /// Builds an index from a movie table and matching matrix rows
    pub fn new(movies: Vec<Movie>, rows: Vec<Vec<f64>>) -> AppResult<Self> {
        let n = movies.len();

        if n == 0 {
            return Err(AppError::DataLoad("Movie table is empty".to_string()));
        }

        if rows.len() != n {
            return Err(AppError::DataLoad(format!(
                "Similarity matrix has {} rows but the movie table has {} entries",
                rows.len(),
                n
            )));
        }

        let mut scores = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(AppError::DataLoad(format!(
                    "Similarity matrix row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            scores.extend(row);
        }

        Ok(Self { movies, scores })
    }

    /// Loads the movie table and similarity matrix from their JSON artifacts
    pub fn load(movie_list_path: impl AsRef<Path>, similarity_path: impl AsRef<Path>) -> AppResult<Self> {
        let movies: Vec<Movie> = read_json(movie_list_path.as_ref())?;
        let rows: Vec<Vec<f64>> = read_json(similarity_path.as_ref())?;

        let index = Self::new(movies, rows)?;

        tracing::info!(
            movies = index.len(),
            genres = index.genres().len(),
            "Loaded similarity index"
        );

        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Row index of the first movie with exactly this title
    pub fn lookup_index(&self, title: &str) -> AppResult<usize> {
        self.movies
            .iter()
            .position(|m| m.title == title)
            .ok_or_else(|| AppError::TitleNotFound(title.to_string()))
    }

    /// The full, unmodified matrix row for `index` as `(column, score)` pairs
    pub fn neighbor_scores(&self, index: usize) -> AppResult<Vec<(usize, f64)>> {
        let n = self.len();
        if index >= n {
            return Err(AppError::NotFound(format!("Row {} is out of range", index)));
        }

        Ok(self.scores[index * n..(index + 1) * n]
            .iter()
            .copied()
            .enumerate()
            .collect())
    }

    pub fn movie_at(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn movie_by_id(&self, movie_id: i64) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == movie_id)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// First `limit` movies tagged with `genre`, in table order
    pub fn movies_in_genre(&self, genre: &str, limit: usize) -> Vec<&Movie> {
        self.movies
            .iter()
            .filter(|m| m.has_genre(genre))
            .take(limit)
            .collect()
    }

    /// Case-insensitive substring search over titles
    pub fn search_titles(&self, query: &str) -> AppResult<Vec<&Movie>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        Ok(self
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .collect())
    }

    /// Every distinct genre tag in the catalog
    pub fn genres(&self) -> BTreeSet<&str> {
        self.movies
            .iter()
            .flat_map(|m| m.genres.iter().map(String::as_str))
            .collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let file = File::open(path).map_err(|e| {
        AppError::DataLoad(format!("Failed to open {}: {}", path.display(), e))
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::DataLoad(format!("Failed to parse {}: {}", path.display(), e))
    })
}
