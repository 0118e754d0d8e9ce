use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reelmatch::{
    api::{create_router, AppState},
    cache::{create_redis_client, Cache, CacheWriterHandle},
    config::Config,
    services::{
        Corpus, MetadataProvider, RecommendationLimits, Recommender, SimilarityIndex,
        TmdbProvider,
    },
};

#[derive(Parser)]
#[command(name = "reelmatch")]
#[command(about = "Content-based movie recommendations from synopsis, genre and title")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the similarity model from a movie CSV and save it
    Train {
        /// Movie CSV (defaults to DATA_PATH)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Output model file (defaults to MODEL_PATH)
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Serve recommendations over HTTP
    Serve {
        /// Train from DATA_PATH first when the model file does not exist
        #[arg(long)]
        build_if_missing: bool,
    },
    /// Print recommendations for a title
    Recommend {
        title: String,
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Print every title in the model
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Train { data, model } => {
            let data = data.unwrap_or_else(|| PathBuf::from(&config.data_path));
            let model = model.unwrap_or_else(|| PathBuf::from(&config.model_path));
            let index = train(&config, data, model).await?;
            println!(
                "Trained model on {} movies ({} terms)",
                index.len(),
                index.vocabulary_size()
            );
        }
        Commands::Serve { build_if_missing } => {
            serve(config, build_if_missing).await?;
        }
        Commands::Recommend { title, top_n } => {
            let recommender = Recommender::from_index(
                SimilarityIndex::load_from_path(&config.model_path)?,
                RecommendationLimits::from(&config),
            );
            let set = recommender.get_recommendations(&title, top_n)?;
            println!("Because you searched for \"{}\":", set.matched_title);
            for (rank, rec) in set.recommendations.iter().enumerate() {
                println!(
                    "{:>2}. {} [{}] {:.3}",
                    rank + 1,
                    rec.movie.title,
                    rec.movie.genre,
                    rec.similarity_score
                );
            }
        }
        Commands::List => {
            let index = SimilarityIndex::load_from_path(&config.model_path)?;
            for title in index.list_titles() {
                println!("{}", title);
            }
        }
    }

    Ok(())
}

/// Builds and saves the model off the async runtime
async fn train(config: &Config, data: PathBuf, model: PathBuf) -> anyhow::Result<SimilarityIndex> {
    let params = config.index_params();
    let index = tokio::task::spawn_blocking(move || -> anyhow::Result<SimilarityIndex> {
        let corpus = Corpus::load(&data)?;
        let index = SimilarityIndex::build(corpus, &params)?;
        index.save_to_path(&model)?;
        Ok(index)
    })
    .await
    .context("Training task panicked")??;
    Ok(index)
}

async fn serve(config: Config, build_if_missing: bool) -> anyhow::Result<()> {
    let limits = RecommendationLimits::from(&config);
    let model_path = PathBuf::from(&config.model_path);

    let recommender = if build_if_missing && !model_path.exists() {
        tracing::info!(path = %model_path.display(), "Model missing, training first");
        match train(&config, PathBuf::from(&config.data_path), model_path.clone()).await {
            Ok(index) => Recommender::from_index(index, limits),
            Err(e) => {
                tracing::warn!(error = %e, "Training failed, serving without a model");
                Recommender::unavailable(e.to_string(), limits)
            }
        }
    } else {
        Recommender::load_or_unavailable(&model_path, limits)
    };

    let (metadata, cache_handle) = metadata_provider(&config);
    let state = AppState::new(recommender, metadata);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

fn metadata_provider(
    config: &Config,
) -> (Option<Arc<dyn MetadataProvider>>, Option<CacheWriterHandle>) {
    let Some(api_key) = config.tmdb_api_key() else {
        tracing::info!("TMDB_API_KEY not set, metadata enrichment disabled");
        return (None, None);
    };

    let (cache, handle) = match config.redis_url.as_deref().map(create_redis_client) {
        Some(Ok(client)) => {
            let (cache, handle) = Cache::new(client);
            (Some(cache), Some(handle))
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Invalid REDIS_URL, metadata lookups will not be cached");
            (None, None)
        }
        None => (None, None),
    };

    let provider = TmdbProvider::new(
        api_key,
        config.tmdb_base_url.clone(),
        config.tmdb_image_base_url.clone(),
        cache,
    );
    tracing::info!(provider = provider.name(), "Metadata enrichment enabled");

    (Some(Arc::new(provider)), handle)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
