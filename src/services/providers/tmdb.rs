//! TMDB (The Movie Database) v3 provider
//!
//! API Flow:
//! 1. Search: /search/movie?query=&year= → first hit gives the TMDB id and poster path
//! 2. Details: /movie/{id} and trailers via /movie/{id}/videos
//! 3. Trending: /trending/movie/week

use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::{AppError, AppResult},
    models::{
        MovieDetails, TmdbMovie, TmdbMovieDetails, TmdbPage, TmdbVideo, TrendingMovie,
    },
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const TRENDING_CACHE_TTL: u64 = 86400; // 1 day

const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    image_base_url: String,
    cache: Option<Cache>,
}

impl TmdbProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        image_base_url: impl Into<String>,
        cache: Option<Cache>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            image_base_url: image_base_url.into(),
            cache,
        }
    }

    fn image_url(&self, path: Option<&str>) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", self.image_base_url, p))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn search_results(&self, title: &str, year: Option<i32>) -> AppResult<Vec<TmdbMovie>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search title cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::MovieSearch {
                title: title.to_string(),
                year,
            },
            SEARCH_CACHE_TTL,
            async move {
                let mut query = vec![("query", title.to_string())];
                if let Some(year) = year {
                    query.push(("year", year.to_string()));
                }

                let page: TmdbPage<TmdbMovie> = self.get_json("/search/movie", &query).await?;

                tracing::debug!(
                    title = %title,
                    results = page.results.len(),
                    "TMDB search completed"
                );

                Ok::<_, AppError>(page.results)
            }
        )
    }

    async fn trending_results(&self) -> AppResult<Vec<TmdbMovie>> {
        cached!(self.cache, CacheKey::Trending, TRENDING_CACHE_TTL, async move {
            let page: TmdbPage<TmdbMovie> = self.get_json("/trending/movie/week", &[]).await?;
            Ok::<_, AppError>(page.results)
        })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search_movie(&self, title: &str, year: Option<i32>) -> AppResult<Option<TmdbMovie>> {
        Ok(self.search_results(title, year).await?.into_iter().next())
    }

    async fn poster_url(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>> {
        let movie = self.search_movie(title, year).await?;
        Ok(movie.and_then(|m| self.image_url(m.poster_path.as_deref())))
    }

    async fn trailer_url(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>> {
        let Some(movie) = self.search_movie(title, year).await? else {
            return Ok(None);
        };

        let videos: TmdbPage<TmdbVideo> = self
            .get_json(&format!("/movie/{}/videos", movie.id), &[])
            .await?;

        Ok(videos
            .results
            .into_iter()
            .find(|v| v.video_type == "Trailer" && v.site == "YouTube")
            .map(|v| format!("{}{}", YOUTUBE_WATCH_URL, v.key)))
    }

    async fn movie_details(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> AppResult<Option<MovieDetails>> {
        let Some(movie) = self.search_movie(title, year).await? else {
            return Ok(None);
        };

        let details: TmdbMovieDetails = self.get_json(&format!("/movie/{}", movie.id), &[]).await?;

        let names = |items: Vec<crate::models::TmdbNamed>| -> Vec<String> {
            items.into_iter().map(|n| n.name).collect()
        };

        Ok(Some(MovieDetails {
            title: details.title.unwrap_or_else(|| title.to_string()),
            overview: details.overview.unwrap_or_default(),
            poster_url: self.image_url(details.poster_path.as_deref()),
            backdrop_url: self.image_url(details.backdrop_path.as_deref()),
            release_date: details.release_date.unwrap_or_default(),
            runtime: details.runtime.unwrap_or(0),
            vote_average: details.vote_average.unwrap_or(0.0),
            vote_count: details.vote_count.unwrap_or(0),
            genres: names(details.genres),
            production_companies: names(details.production_companies),
            spoken_languages: names(details.spoken_languages),
        }))
    }

    async fn trending(&self, limit: usize) -> AppResult<Vec<TrendingMovie>> {
        let movies = self.trending_results().await?;

        Ok(movies
            .into_iter()
            .take(limit)
            .map(|m| TrendingMovie {
                poster_url: self.image_url(m.poster_path.as_deref()),
                id: m.id,
                title: m.title,
                overview: m.overview.unwrap_or_default(),
                vote_average: m.vote_average.unwrap_or(0.0),
                release_date: m.release_date.unwrap_or_default(),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
