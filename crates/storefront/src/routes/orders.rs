//! Checkout and order history handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bookstore_core::{OrderId, OrderStatus};

use crate::db::Database;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{DeliveryAddress, Order, OrderSummary};
use crate::services::{AccountCart, Cart, CartService, OrderLifecycle, OrderService};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub delivery: DeliveryAddress,
}

/// Query parameters for the order history.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
}

/// Turn the signed-in account's cart into an order.
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn checkout<D: Database>(
    State(state): State<AppState<D>>,
    RequireAuth(account): RequireAuth,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<Order>)> {
    let cart = Cart::Account(AccountCart::new(account.id));
    let lines = CartService::new(state.db()).snapshot(&cart).await?;

    let order = OrderService::new(state.db(), state.pickup_stores())
        .commit(account.id, &lines, &form.delivery)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Order history, newest first.
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn list<D: Database>(
    State(state): State<AppState<D>>,
    RequireAuth(account): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderLifecycle::new(state.db())
        .list(account.id, query.status)
        .await?;
    Ok(Json(orders))
}

/// Mark an order as received.
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn received<D: Database>(
    State(state): State<AppState<D>>,
    RequireAuth(account): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderLifecycle::new(state.db())
        .mark_received(account.id, order_id)
        .await?;
    Ok(Json(order))
}
