use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::get_status))
        // Catalog
        .route(
            "/catalog",
            get(handlers::get_catalog).put(handlers::replace_catalog),
        )
        .route("/genres", get(handlers::get_genres))
        // Signals
        .route("/users/:user_id/upvotes", get(handlers::get_upvotes))
        .route(
            "/users/:user_id/upvotes/:item_id",
            put(handlers::add_upvote).delete(handlers::remove_upvote),
        )
        // Ranking
        .route("/users/:user_id/feed", get(handlers::get_feed))
        .route("/rerank", post(handlers::rerank_candidates))
}
