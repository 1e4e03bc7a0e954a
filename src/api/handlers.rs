use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{Candidate, Item, ItemId, ModelStatus, RankedItem, Signal, GENRE_VOCABULARY},
    services::{
        interactions,
        recommendations::{self, Feed, FeedOptions},
        rerank, Catalog,
    },
};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: ModelStatus,
    pub provider: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CatalogSummary {
    pub item_count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub limit: Option<usize>,
}

impl From<FeedQuery> for FeedOptions {
    fn from(query: FeedQuery) -> Self {
        Self {
            query: query.q,
            genre: query.genre,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RerankRequest {
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub upvoted_item_ids: BTreeSet<ItemId>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Readiness of the remote ranking model
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.ranking_provider.model_status().await,
        provider: state.ranking_provider.name(),
    })
}

/// Replaces the catalog snapshot
pub async fn replace_catalog(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(items): Json<Vec<Item>>,
) -> AppResult<Json<CatalogSummary>> {
    let catalog = Catalog::new(items)?;
    let item_count = catalog.len();
    state.replace_catalog(catalog).await;

    tracing::info!(request_id = %request_id, item_count, "Replaced catalog");

    Ok(Json(CatalogSummary { item_count }))
}

/// Searches and filters the catalog
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> Json<Vec<Item>> {
    let inner = state.inner.read().await;
    Json(
        inner
            .catalog
            .filter(params.q.as_deref(), params.genre.as_deref()),
    )
}

/// Closed genre vocabulary
pub async fn get_genres() -> Json<Vec<&'static str>> {
    Json(GENRE_VOCABULARY.to_vec())
}

/// Current upvotes of a user
pub async fn get_upvotes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Signal>> {
    let signal = interactions::current_upvotes(&state, &user_id).await?;
    Ok(Json(signal))
}

/// Records an upvote
pub async fn add_upvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, item_id)): Path<(String, u64)>,
) -> AppResult<Json<Signal>> {
    tracing::debug!(request_id = %request_id, user_id = %user_id, item_id, "Upvote request");
    let signal = interactions::record_upvote(&state, &user_id, ItemId(item_id), true).await?;
    Ok(Json(signal))
}

/// Retracts an upvote
pub async fn remove_upvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, item_id)): Path<(String, u64)>,
) -> AppResult<Json<Signal>> {
    tracing::debug!(request_id = %request_id, user_id = %user_id, item_id, "Retract upvote request");
    let signal = interactions::record_upvote(&state, &user_id, ItemId(item_id), false).await?;
    Ok(Json(signal))
}

/// Personalized feed: provider recommendations first, each partition reranked
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(params): Query<FeedQuery>,
) -> AppResult<Json<Feed>> {
    tracing::info!(request_id = %request_id, user_id = %user_id, "Processing feed request");

    let feed = recommendations::get_feed(&state, &user_id, &params.into()).await?;
    Ok(Json(feed))
}

/// Reranks caller-supplied candidates against a caller-supplied signal
pub async fn rerank_candidates(
    State(state): State<AppState>,
    Json(request): Json<RerankRequest>,
) -> Json<Vec<RankedItem>> {
    Json(rerank(
        request.candidates,
        &request.upvoted_item_ids,
        &state.policy,
    ))
}
