use serde::{Deserialize, Serialize};

pub mod movie;

pub use movie::{fingerprint, serialize_or_na, MovieRecord, RawMovieRow};

/// A recommended movie and its similarity to the queried title
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub movie: MovieRecord,
    /// Cosine similarity rounded to 3 decimal places
    pub similarity_score: f64,
}

/// Result of resolving a query title and reading its neighbours
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSet {
    /// Title of the corpus entry the query resolved to
    pub matched_title: String,
    pub recommendations: Vec<Recommendation>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Search hit from `GET /search/movie`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

/// Paged list wrapper used by TMDB search and trending endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbNamed {
    pub name: String,
}

/// Response of `GET /movie/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub genres: Vec<TmdbNamed>,
    #[serde(default)]
    pub production_companies: Vec<TmdbNamed>,
    #[serde(default)]
    pub spoken_languages: Vec<TmdbNamed>,
}

/// Entry of `GET /movie/{id}/videos`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
}

/// Movie details returned to clients, with image paths expanded to URLs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: String,
    pub runtime: u32,
    pub vote_average: f64,
    pub vote_count: u64,
    pub genres: Vec<String>,
    pub production_companies: Vec<String>,
    pub spoken_languages: Vec<String>,
}

/// A currently trending movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingMovie {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub vote_average: f64,
    pub release_date: String,
}
