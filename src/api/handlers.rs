use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{serialize_or_na, MovieDetails, Recommendation, RecommendationSet, TrendingMovie},
    services::ModelStatus,
};

use super::AppState;

const DEFAULT_TRENDING_LIMIT: usize = 10;
const MAX_TRENDING_LIMIT: usize = 20;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub title: String,
    pub genre: String,
    pub overview: String,
    #[serde(serialize_with = "serialize_or_na")]
    pub rating: Option<f64>,
    #[serde(serialize_with = "serialize_or_na")]
    pub year: Option<i32>,
    pub similarity_score: f64,
}

impl From<&Recommendation> for RecommendationResponse {
    fn from(rec: &Recommendation) -> Self {
        Self {
            title: rec.movie.title.clone(),
            genre: rec.movie.genre.clone(),
            overview: rec.movie.overview.clone(),
            rating: rec.movie.rating,
            year: rec.movie.year,
            similarity_score: rec.similarity_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub query: String,
    pub matched_title: String,
    pub recommendations: Vec<RecommendationResponse>,
}

impl RecommendationsResponse {
    fn new(query: String, set: &RecommendationSet) -> Self {
        Self {
            query,
            matched_title: set.matched_title.clone(),
            recommendations: set
                .recommendations
                .iter()
                .map(RecommendationResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub count: usize,
    pub titles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RandomMovieResponse {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct PosterResponse {
    pub title: String,
    pub poster_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrailerResponse {
    pub title: String,
    pub trailer_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailsResponse {
    pub title: String,
    pub details: Option<MovieDetails>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<usize>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Whether a model is loaded, and what it was built from
pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.recommender().status())
}

/// All titles in corpus order
pub async fn list_movies(State(state): State<AppState>) -> AppResult<Json<MovieListResponse>> {
    let titles = state.recommender().get_movie_list()?;
    Ok(Json(MovieListResponse {
        count: titles.len(),
        titles,
    }))
}

pub async fn random_movie(State(state): State<AppState>) -> AppResult<Json<RandomMovieResponse>> {
    let title = state
        .recommender()
        .random_title()?
        .ok_or_else(|| AppError::MovieNotFound(String::new()))?;
    Ok(Json(RandomMovieResponse { title }))
}

/// Movies most similar to the one named by `title`
pub async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    if params.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Please enter a movie title".to_string(),
        ));
    }

    let set = state
        .recommender()
        .get_recommendations(&params.title, params.top_n)?;
    Ok(Json(RecommendationsResponse::new(params.title, &set)))
}

pub async fn poster(
    State(state): State<AppState>,
    Query(params): Query<MetadataQuery>,
) -> AppResult<Json<PosterResponse>> {
    let poster_url = match state.metadata() {
        Some(provider) => degrade(
            provider.name(),
            provider.poster_url(&params.title, params.year).await,
        )?,
        None => None,
    };
    Ok(Json(PosterResponse {
        title: params.title,
        poster_url,
    }))
}

pub async fn trailer(
    State(state): State<AppState>,
    Query(params): Query<MetadataQuery>,
) -> AppResult<Json<TrailerResponse>> {
    let trailer_url = match state.metadata() {
        Some(provider) => degrade(
            provider.name(),
            provider.trailer_url(&params.title, params.year).await,
        )?,
        None => None,
    };
    Ok(Json(TrailerResponse {
        title: params.title,
        trailer_url,
    }))
}

pub async fn details(
    State(state): State<AppState>,
    Query(params): Query<MetadataQuery>,
) -> AppResult<Json<DetailsResponse>> {
    let details = match state.metadata() {
        Some(provider) => degrade(
            provider.name(),
            provider.movie_details(&params.title, params.year).await,
        )?,
        None => None,
    };
    Ok(Json(DetailsResponse {
        title: params.title,
        details,
    }))
}

pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> AppResult<Json<Vec<TrendingMovie>>> {
    let limit = match params.limit {
        Some(0) => {
            return Err(AppError::InvalidInput(
                "limit must be at least 1".to_string(),
            ))
        }
        Some(n) => n.min(MAX_TRENDING_LIMIT),
        None => DEFAULT_TRENDING_LIMIT,
    };

    let movies = match state.metadata() {
        Some(provider) => degrade(provider.name(), provider.trending(limit).await)?,
        None => Vec::new(),
    };
    Ok(Json(movies))
}

/// Metadata is optional: provider failures become empty results, only bad
/// input is reported to the caller.
fn degrade<T: Default>(provider: &str, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e @ AppError::InvalidInput(_)) => Err(e),
        Err(e) => {
            tracing::warn!(provider, error = %e, "Metadata lookup failed");
            Ok(T::default())
        }
    }
}
