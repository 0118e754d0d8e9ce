use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/model", get(handlers::model_status))
        // Corpus
        .route("/movies", get(handlers::list_movies))
        .route("/movies/random", get(handlers::random_movie))
        .route("/recommendations", get(handlers::recommendations))
        // Metadata enrichment
        .route("/metadata/poster", get(handlers::poster))
        .route("/metadata/trailer", get(handlers::trailer))
        .route("/metadata/details", get(handlers::details))
        .route("/trending", get(handlers::trending))
}
