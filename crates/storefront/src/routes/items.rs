//! Catalog and review handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bookstore_core::{ItemId, Score};

use crate::db::Database;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Item, ItemAvailability, Review};
use crate::services::{CatalogService, DEFAULT_TOP_SELLERS, ReviewService};
use crate::state::AppState;

/// Largest accepted `limit` for the best-seller shelf.
const MAX_TOP_SELLERS: usize = 50;

/// Query parameters for the best-seller shelf.
#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

/// Query parameters for the catalog search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Review submission body.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub score: Score,
    pub body: Option<String>,
}

/// Best-selling items that are in stock.
#[instrument(skip(state))]
pub async fn top<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<Item>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TOP_SELLERS)
        .min(MAX_TOP_SELLERS);
    let items = CatalogService::new(state.db()).top_sellers(limit).await?;
    Ok(Json(items))
}

/// Items whose title or author contains `q`, ignoring case.
#[instrument(skip(state))]
pub async fn search<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>> {
    let items = CatalogService::new(state.db()).search(&query.q).await?;
    Ok(Json(items))
}

/// A single item with its stock.
#[instrument(skip(state))]
pub async fn show<D: Database>(
    State(state): State<AppState<D>>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<ItemAvailability>> {
    Ok(Json(CatalogService::new(state.db()).item(item_id).await?))
}

/// Reviews of an item, newest first.
#[instrument(skip(state))]
pub async fn reviews<D: Database>(
    State(state): State<AppState<D>>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(ReviewService::new(state.db()).list(item_id).await?))
}

/// Review an item. One review per account and item.
#[instrument(skip(state, account, form), fields(account_id = %account.id, score = form.score.get()))]
pub async fn review<D: Database>(
    State(state): State<AppState<D>>,
    RequireAuth(account): RequireAuth,
    Path(item_id): Path<ItemId>,
    Json(form): Json<ReviewForm>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state.db())
        .submit(account.id, item_id, form.score, form.body)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
