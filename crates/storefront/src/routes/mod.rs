//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (storage reachable)
//! POST /auth/logout            - Sign out
//!
//! # Catalog
//! GET  /items/top              - In-stock best sellers (?limit=N)
//! GET  /items/search           - Title or author search (?q=text)
//! GET  /items/{id}             - Item with available stock
//! GET  /items/{id}/reviews     - Reviews, newest first
//! POST /items/{id}/reviews     - Submit a review (requires auth)
//!
//! # Cart (guest or account)
//! GET  /cart                   - Snapshot and total
//! POST /cart/total             - Total of selected lines
//! POST /cart/add               - Add units of an item
//! POST /cart/decrement         - Take one unit away
//! POST /cart/remove            - Remove the line
//! POST /cart/clear             - Remove every line
//!
//! # Orders (requires auth)
//! POST /checkout               - Place an order from the account cart
//! GET  /orders                 - Order history (?status=active|complete)
//! POST /orders/{id}/received   - Mark an order complete
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod items;
pub mod orders;

use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::db::Database;
use crate::state::AppState;

/// Create the catalog routes router.
pub fn item_routes<D: Database>() -> Router<AppState<D>> {
    Router::new()
        .route("/items/top", get(items::top::<D>))
        .route("/items/search", get(items::search::<D>))
        .route("/items/{id}", get(items::show::<D>))
        .route(
            "/items/{id}/reviews",
            get(items::reviews::<D>).post(items::review::<D>),
        )
}

/// Create the cart routes router.
pub fn cart_routes<D: Database>() -> Router<AppState<D>> {
    Router::new()
        .route("/cart", get(cart::show::<D>))
        .route("/cart/total", post(cart::total::<D>))
        .route("/cart/add", post(cart::add::<D>))
        .route("/cart/decrement", post(cart::decrement::<D>))
        .route("/cart/remove", post(cart::remove::<D>))
        .route("/cart/clear", post(cart::clear::<D>))
}

/// Create the checkout and order history routes router.
pub fn order_routes<D: Database>() -> Router<AppState<D>> {
    Router::new()
        .route("/checkout", post(orders::checkout::<D>))
        .route("/orders", get(orders::list::<D>))
        .route("/orders/{id}/received", post(orders::received::<D>))
}

/// Create all routes for the storefront.
pub fn routes<D: Database>() -> Router<AppState<D>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness::<D>))
        .route("/auth/logout", post(auth::logout))
        .merge(item_routes())
        .merge(cart_routes())
        .merge(order_routes())
}

/// Build the full application: routes, session layer and request tracing.
///
/// The session store is a parameter so tests can run against an in-memory
/// store.
pub fn app<D, S>(state: AppState<D>, session_layer: SessionManagerLayer<S>) -> Router
where
    D: Database,
    S: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
