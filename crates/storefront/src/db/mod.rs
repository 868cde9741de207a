//! Storage for the storefront.
//!
//! Services talk to storage through the [`Database`] and [`Transaction`]
//! traits. Every unit of work runs inside one transaction: changes become
//! visible on [`Transaction::commit`] and are discarded when the transaction
//! is dropped.
//!
//! Two backends implement the traits:
//!
//! - [`PgDatabase`] - `PostgreSQL` via sqlx, used in production
//! - [`MemoryDatabase`] - in-process tables, used by tests and local runs
//!
//! ## Tables
//!
//! - `items` - Catalog with running rating mean and count
//! - `stock` - Available quantity per item
//! - `cart_items` - Account cart lines
//! - `orders` / `order_items` - Placed orders and their frozen lines
//! - `reviews` - One review per account and item
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bookstore-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bookstore_core::{AccountId, ItemId, OrderId, OrderStatus, Price, RatingSummary};

use crate::models::{CartLine, Item, NewItem, NewOrder, NewReview, Order, OrderLine, Review};

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate review).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A storage backend that hands out transactions.
#[async_trait]
pub trait Database: Clone + Send + Sync + 'static {
    /// Transaction type of this backend.
    type Tx: Transaction;

    /// Start a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if no connection can be acquired.
    async fn begin(&self) -> Result<Self::Tx, RepositoryError>;
}

/// A unit of work over all storefront tables.
#[async_trait]
pub trait Transaction:
    CatalogRepository
    + StockRepository
    + CartRepository
    + OrderRepository
    + ReviewRepository
    + Send
    + Sized
{
    /// Make every change of this transaction visible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the commit fails; nothing is
    /// applied in that case.
    async fn commit(self) -> Result<(), RepositoryError>;
}

/// Catalog reads and rating updates.
#[async_trait]
pub trait CatalogRepository: Send {
    /// Get an item by ID.
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError>;

    /// Get an item by ID and lock its row until the transaction ends.
    ///
    /// Read-modify-write updates of an item (its rating) go through this so
    /// that concurrent writers queue up instead of overwriting each other.
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError>;

    /// Get every existing item among `ids`, in no particular order.
    async fn items(&mut self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError>;

    /// Insert a new item with no reviews.
    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, RepositoryError>;

    /// Overwrite the rating summary of an item.
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    async fn set_rating(
        &mut self,
        id: ItemId,
        rating: RatingSummary,
    ) -> Result<(), RepositoryError>;

    /// Change the unit price of an item. Existing order lines keep theirs.
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    async fn set_price(&mut self, id: ItemId, price: Price) -> Result<(), RepositoryError>;

    /// In-stock items ranked by units sold, then rating, then ID.
    async fn top_items(&mut self, limit: usize) -> Result<Vec<Item>, RepositoryError>;

    /// Items whose title or author contains `query`, ignoring case, ordered
    /// by title then ID.
    async fn search_items(
        &mut self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError>;
}

/// Stock records.
#[async_trait]
pub trait StockRepository: Send {
    /// Current stock of an item, `None` if the item has no stock record.
    async fn stock(&mut self, id: ItemId) -> Result<Option<i32>, RepositoryError>;

    /// Decrement stock by `quantity` only if at least that much is available.
    ///
    /// Returns `false` (and changes nothing) when the stock is insufficient
    /// or missing.
    async fn decrement_stock(&mut self, id: ItemId, quantity: i32)
    -> Result<bool, RepositoryError>;

    /// Create or replace the stock record of an item.
    async fn set_stock(&mut self, id: ItemId, quantity: i32) -> Result<(), RepositoryError>;
}

/// Persisted account cart lines.
#[async_trait]
pub trait CartRepository: Send {
    /// All lines of an account cart.
    async fn cart_lines(&mut self, account: AccountId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Quantity of one item in an account cart, 0 if absent.
    async fn cart_quantity(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<i32, RepositoryError>;

    /// Insert or replace a line.
    async fn upsert_cart_line(
        &mut self,
        account: AccountId,
        line: CartLine,
    ) -> Result<(), RepositoryError>;

    /// Delete a line if present.
    async fn remove_cart_line(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<(), RepositoryError>;

    /// Delete every line of an account cart.
    async fn clear_cart(&mut self, account: AccountId) -> Result<(), RepositoryError>;
}

/// Orders and order lines.
#[async_trait]
pub trait OrderRepository: Send {
    /// Insert an `active` order.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// Insert one line of an existing order.
    async fn insert_order_line(&mut self, line: &OrderLine) -> Result<(), RepositoryError>;

    /// Get an order of `account`, locking it until the transaction ends.
    async fn order_for_update(
        &mut self,
        account: AccountId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Set the status of an order.
    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError>;

    /// Orders of an account, newest first, optionally filtered by status.
    async fn orders(
        &mut self,
        account: AccountId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Lines of the given orders.
    async fn order_lines(&mut self, ids: &[OrderId]) -> Result<Vec<OrderLine>, RepositoryError>;
}

/// Reviews.
#[async_trait]
pub trait ReviewRepository: Send {
    /// Whether `account` already reviewed `item`.
    async fn review_exists(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<bool, RepositoryError>;

    /// Insert a review.
    ///
    /// Returns `RepositoryError::Conflict` if the account already reviewed the item.
    async fn insert_review(&mut self, review: &NewReview) -> Result<Review, RepositoryError>;

    /// Reviews of an item, newest first.
    async fn reviews(&mut self, item: ItemId) -> Result<Vec<Review>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound of pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2.min(max_connections))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
