//! Movie metadata enrichment
//!
//! Providers look up posters, trailers, details and trending lists for titles
//! served by the recommender. Recommendations never depend on a provider being
//! configured or reachable.

use crate::{
    error::AppResult,
    models::{MovieDetails, TmdbMovie, TrendingMovie},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Source of movie metadata keyed by title and optional release year
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Best search hit for a title, if any
    async fn search_movie(&self, title: &str, year: Option<i32>) -> AppResult<Option<TmdbMovie>>;

    /// Full poster image URL
    async fn poster_url(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>>;

    /// URL of the first YouTube trailer
    async fn trailer_url(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>>;

    async fn movie_details(&self, title: &str, year: Option<i32>)
        -> AppResult<Option<MovieDetails>>;

    /// Movies trending this week, at most `limit`
    async fn trending(&self, limit: usize) -> AppResult<Vec<TrendingMovie>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
