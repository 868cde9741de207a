//! `PostgreSQL` storage backend.
//!
//! Each [`PgTransaction`] wraps one `sqlx` transaction. Dropping it without
//! calling [`Transaction::commit`] rolls back.

mod cart;
mod catalog;
mod orders;
mod reviews;
mod stock;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use bookstore_core::{AccountId, ItemId, OrderId, OrderStatus, Price, RatingSummary};

use super::{
    CartRepository, CatalogRepository, Database, OrderRepository, RepositoryError,
    ReviewRepository, StockRepository, Transaction,
};
use crate::models::{CartLine, Item, NewItem, NewOrder, NewReview, Order, OrderLine, Review};

/// Storage backend over a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgTransaction { tx })
    }
}

/// A transaction over a [`PgDatabase`].
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for PgTransaction {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        catalog::item(&mut self.tx, id).await
    }

    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        catalog::item_for_update(&mut self.tx, id).await
    }

    async fn items(&mut self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError> {
        catalog::items(&mut self.tx, ids).await
    }

    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, RepositoryError> {
        catalog::insert_item(&mut self.tx, item).await
    }

    async fn set_rating(
        &mut self,
        id: ItemId,
        rating: RatingSummary,
    ) -> Result<(), RepositoryError> {
        catalog::set_rating(&mut self.tx, id, rating).await
    }

    async fn set_price(&mut self, id: ItemId, price: Price) -> Result<(), RepositoryError> {
        catalog::set_price(&mut self.tx, id, price).await
    }

    async fn top_items(&mut self, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        catalog::top_items(&mut self.tx, limit).await
    }

    async fn search_items(
        &mut self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        catalog::search_items(&mut self.tx, query, limit).await
    }
}

#[async_trait]
impl StockRepository for PgTransaction {
    async fn stock(&mut self, id: ItemId) -> Result<Option<i32>, RepositoryError> {
        stock::stock(&mut self.tx, id).await
    }

    async fn decrement_stock(
        &mut self,
        id: ItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        stock::decrement_stock(&mut self.tx, id, quantity).await
    }

    async fn set_stock(&mut self, id: ItemId, quantity: i32) -> Result<(), RepositoryError> {
        stock::set_stock(&mut self.tx, id, quantity).await
    }
}

#[async_trait]
impl CartRepository for PgTransaction {
    async fn cart_lines(&mut self, account: AccountId) -> Result<Vec<CartLine>, RepositoryError> {
        cart::cart_lines(&mut self.tx, account).await
    }

    async fn cart_quantity(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<i32, RepositoryError> {
        cart::cart_quantity(&mut self.tx, account, item).await
    }

    async fn upsert_cart_line(
        &mut self,
        account: AccountId,
        line: CartLine,
    ) -> Result<(), RepositoryError> {
        cart::upsert_cart_line(&mut self.tx, account, line).await
    }

    async fn remove_cart_line(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<(), RepositoryError> {
        cart::remove_cart_line(&mut self.tx, account, item).await
    }

    async fn clear_cart(&mut self, account: AccountId) -> Result<(), RepositoryError> {
        cart::clear_cart(&mut self.tx, account).await
    }
}

#[async_trait]
impl OrderRepository for PgTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        orders::insert_order(&mut self.tx, order).await
    }

    async fn insert_order_line(&mut self, line: &OrderLine) -> Result<(), RepositoryError> {
        orders::insert_order_line(&mut self.tx, line).await
    }

    async fn order_for_update(
        &mut self,
        account: AccountId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        orders::order_for_update(&mut self.tx, account, id).await
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        orders::set_order_status(&mut self.tx, id, status).await
    }

    async fn orders(
        &mut self,
        account: AccountId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        orders::orders(&mut self.tx, account, status).await
    }

    async fn order_lines(&mut self, ids: &[OrderId]) -> Result<Vec<OrderLine>, RepositoryError> {
        orders::order_lines(&mut self.tx, ids).await
    }
}

#[async_trait]
impl ReviewRepository for PgTransaction {
    async fn review_exists(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<bool, RepositoryError> {
        reviews::review_exists(&mut self.tx, account, item).await
    }

    async fn insert_review(&mut self, review: &NewReview) -> Result<Review, RepositoryError> {
        reviews::insert_review(&mut self.tx, review).await
    }

    async fn reviews(&mut self, item: ItemId) -> Result<Vec<Review>, RepositoryError> {
        reviews::reviews(&mut self.tx, item).await
    }
}
