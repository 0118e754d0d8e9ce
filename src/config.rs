use serde::Deserialize;

use crate::services::index::IndexParams;

/// Placeholder key shipped in sample `.env` files; treated as "not configured"
const TMDB_PLACEHOLDER_KEY: &str = "your_api_key_here";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Movie corpus CSV used by the train step
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Persisted model artifact
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the caller does not ask for a count
    #[serde(default = "default_recommendations")]
    pub default_recommendations: usize,

    /// Upper bound on the number of recommendations per request
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    #[serde(default = "default_max_vocabulary_size")]
    pub max_vocabulary_size: usize,

    #[serde(default = "default_min_doc_frequency")]
    pub min_doc_frequency: usize,

    #[serde(default = "default_max_doc_frequency_ratio")]
    pub max_doc_frequency_ratio: f64,

    /// TMDB API key for poster/trailer/trending lookups
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    /// TMDB image CDN prefix
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Redis connection URL; metadata lookups are uncached when unset
    #[serde(default)]
    pub redis_url: Option<String>,
}

fn default_data_path() -> String {
    "sample_movies.csv".to_string()
}

fn default_model_path() -> String {
    "model.json".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendations() -> usize {
    5
}

fn default_max_recommendations() -> usize {
    10
}

fn default_max_vocabulary_size() -> usize {
    5000
}

fn default_min_doc_frequency() -> usize {
    2
}

fn default_max_doc_frequency_ratio() -> f64 {
    0.8
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            model_path: default_model_path(),
            host: default_host(),
            port: default_port(),
            default_recommendations: default_recommendations(),
            max_recommendations: default_max_recommendations(),
            max_vocabulary_size: default_max_vocabulary_size(),
            min_doc_frequency: default_min_doc_frequency(),
            max_doc_frequency_ratio: default_max_doc_frequency_ratio(),
            tmdb_api_key: None,
            tmdb_base_url: default_tmdb_base_url(),
            tmdb_image_base_url: default_tmdb_image_base_url(),
            redis_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.max_recommendations == 0 {
            anyhow::bail!("MAX_RECOMMENDATIONS must be at least 1");
        }
        if config.default_recommendations == 0
            || config.default_recommendations > config.max_recommendations
        {
            anyhow::bail!(
                "DEFAULT_RECOMMENDATIONS must be between 1 and {}",
                config.max_recommendations
            );
        }

        Ok(config)
    }

    /// Index build parameters derived from this configuration
    pub fn index_params(&self) -> IndexParams {
        IndexParams {
            max_vocabulary_size: self.max_vocabulary_size,
            min_doc_frequency: self.min_doc_frequency,
            max_doc_frequency_ratio: self.max_doc_frequency_ratio,
            ..IndexParams::default()
        }
    }

    /// TMDB key, if one has been set to something other than the placeholder
    pub fn tmdb_api_key(&self) -> Option<&str> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != TMDB_PLACEHOLDER_KEY)
    }
}
