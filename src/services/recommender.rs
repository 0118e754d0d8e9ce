use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::RecommendationSet,
    services::index::SimilarityIndex,
};

/// Whether the serving process has a usable model
#[derive(Debug, Clone)]
pub enum ModelState {
    Ready(Arc<SimilarityIndex>),
    Unavailable(String),
}

/// How many recommendations a caller gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationLimits {
    pub default_top_n: usize,
    pub max_top_n: usize,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            max_top_n: 10,
        }
    }
}

impl From<&Config> for RecommendationLimits {
    fn from(config: &Config) -> Self {
        Self {
            default_top_n: config.default_recommendations,
            max_top_n: config.max_recommendations,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelStatus {
    pub available: bool,
    pub movie_count: usize,
    pub vocabulary_size: usize,
    pub built_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

/// Owns the loaded model for the lifetime of the serving process
///
/// The state is fixed at construction. Replacing the model means building a
/// new `Recommender` and swapping it in whole.
#[derive(Debug, Clone)]
pub struct Recommender {
    state: ModelState,
    limits: RecommendationLimits,
}

impl Recommender {
    pub fn from_index(index: SimilarityIndex, limits: RecommendationLimits) -> Self {
        Self {
            state: ModelState::Ready(Arc::new(index)),
            limits,
        }
    }

    pub fn unavailable(reason: impl Into<String>, limits: RecommendationLimits) -> Self {
        Self {
            state: ModelState::Unavailable(reason.into()),
            limits,
        }
    }

    /// Loads the artifact at `path`; a missing or corrupt file leaves the
    /// recommender in the unavailable state instead of failing.
    pub fn load_or_unavailable<P: AsRef<Path>>(path: P, limits: RecommendationLimits) -> Self {
        match SimilarityIndex::load_from_path(path.as_ref()) {
            Ok(index) => Self::from_index(index, limits),
            Err(e) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "Model not available, recommendations disabled"
                );
                Self::unavailable(e.to_string(), limits)
            }
        }
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn limits(&self) -> RecommendationLimits {
        self.limits
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    fn index(&self) -> AppResult<&SimilarityIndex> {
        match &self.state {
            ModelState::Ready(index) => Ok(index.as_ref()),
            ModelState::Unavailable(reason) => Err(AppError::ModelUnavailable(reason.clone())),
        }
    }

    /// Resolves the requested count: omitted means the default, above the
    /// maximum is clamped, zero is rejected.
    pub fn effective_top_n(&self, top_n: Option<usize>) -> AppResult<usize> {
        match top_n {
            None => Ok(self.limits.default_top_n),
            Some(0) => Err(AppError::InvalidInput(
                "top_n must be at least 1".to_string(),
            )),
            Some(n) => Ok(n.min(self.limits.max_top_n)),
        }
    }

    pub fn get_recommendations(
        &self,
        title: &str,
        top_n: Option<usize>,
    ) -> AppResult<RecommendationSet> {
        let top_n = self.effective_top_n(top_n)?;
        let index = self.index()?;

        let result = index.query(title, top_n);
        match &result {
            Ok(set) => tracing::debug!(
                query = %title,
                matched = %set.matched_title,
                count = set.recommendations.len(),
                "Recommendations served"
            ),
            Err(AppError::MovieNotFound(_)) => {
                tracing::debug!(query = %title, "Title not in corpus")
            }
            Err(e) => tracing::warn!(query = %title, error = %e, "Recommendation query failed"),
        }
        result
    }

    pub fn get_movie_list(&self) -> AppResult<Vec<String>> {
        Ok(self.index()?.list_titles())
    }

    pub fn movie_count(&self) -> AppResult<usize> {
        Ok(self.index()?.len())
    }

    /// A uniformly random title, `None` for an empty corpus
    pub fn random_title(&self) -> AppResult<Option<String>> {
        let titles = self.get_movie_list()?;
        Ok(titles.choose(&mut rand::rng()).cloned())
    }

    pub fn status(&self) -> ModelStatus {
        match &self.state {
            ModelState::Ready(index) => ModelStatus {
                available: true,
                movie_count: index.len(),
                vocabulary_size: index.vocabulary_size(),
                built_at: Some(index.built_at()),
                reason: None,
            },
            ModelState::Unavailable(reason) => ModelStatus {
                available: false,
                movie_count: 0,
                vocabulary_size: 0,
                built_at: None,
                reason: Some(reason.clone()),
            },
        }
    }
}
