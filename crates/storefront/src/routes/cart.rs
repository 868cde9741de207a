//! Cart route handlers.
//!
//! Guests get a session cart, signed-in accounts their persisted cart. The
//! handlers never branch on which one is in use.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use bookstore_core::{ItemId, Price};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::CartLineView;
use crate::services::{Cart, CartService};
use crate::state::AppState;

/// Cart contents as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Price,
    pub item_count: i64,
}

/// Quantity of one line after a change.
#[derive(Debug, Serialize)]
pub struct LineQuantity {
    pub item_id: ItemId,
    pub quantity: i32,
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub item_id: ItemId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Request naming a single cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub item_id: ItemId,
}

/// Optional selection for the cart total.
#[derive(Debug, Default, Deserialize)]
pub struct TotalForm {
    #[serde(default)]
    pub selected: Vec<ItemId>,
}

fn request_cart(auth: OptionalAuth, session: Session) -> Cart {
    Cart::for_request(auth.0.map(|account| account.id), session)
}

/// Show the cart.
#[instrument(skip(state, auth, session))]
pub async fn show<D: Database>(
    State(state): State<AppState<D>>,
    auth: OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    let service = CartService::new(state.db());
    let lines = service.snapshot(&request_cart(auth, session)).await?;
    let total = service.total(&lines, None);
    let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();

    Ok(Json(CartView {
        lines,
        total,
        item_count,
    }))
}

/// Total of the selected lines (all lines when nothing is selected).
#[instrument(skip(state, auth, session, form))]
pub async fn total<D: Database>(
    State(state): State<AppState<D>>,
    auth: OptionalAuth,
    session: Session,
    Json(form): Json<TotalForm>,
) -> Result<Json<Price>> {
    let service = CartService::new(state.db());
    let lines = service.snapshot(&request_cart(auth, session)).await?;
    Ok(Json(service.total(&lines, Some(&form.selected))))
}

/// Add units of an item.
#[instrument(skip(state, auth, session))]
pub async fn add<D: Database>(
    State(state): State<AppState<D>>,
    auth: OptionalAuth,
    session: Session,
    Json(form): Json<AddForm>,
) -> Result<Json<LineQuantity>> {
    if form.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be positive".to_string(),
        ));
    }

    let quantity = CartService::new(state.db())
        .adjust(
            &request_cart(auth, session),
            form.item_id,
            i64::from(form.quantity),
        )
        .await?;

    Ok(Json(LineQuantity {
        item_id: form.item_id,
        quantity,
    }))
}

/// Take one unit of an item away.
#[instrument(skip(state, auth, session))]
pub async fn decrement<D: Database>(
    State(state): State<AppState<D>>,
    auth: OptionalAuth,
    session: Session,
    Json(form): Json<LineForm>,
) -> Result<Json<LineQuantity>> {
    let quantity = CartService::new(state.db())
        .adjust(&request_cart(auth, session), form.item_id, -1)
        .await?;

    Ok(Json(LineQuantity {
        item_id: form.item_id,
        quantity,
    }))
}

/// Remove an item from the cart entirely.
#[instrument(skip(state, auth, session))]
pub async fn remove<D: Database>(
    State(state): State<AppState<D>>,
    auth: OptionalAuth,
    session: Session,
    Json(form): Json<LineForm>,
) -> Result<Json<LineQuantity>> {
    CartService::new(state.db())
        .remove_all(&request_cart(auth, session), form.item_id)
        .await?;

    Ok(Json(LineQuantity {
        item_id: form.item_id,
        quantity: 0,
    }))
}

/// Empty the cart.
#[instrument(skip(state, auth, session))]
pub async fn clear<D: Database>(
    State(state): State<AppState<D>>,
    auth: OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    CartService::new(state.db())
        .clear(&request_cart(auth, session))
        .await?;

    Ok(Json(CartView {
        lines: Vec::new(),
        total: Price::ZERO,
        item_count: 0,
    }))
}
