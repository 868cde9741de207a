//! Order history and status transitions.

use std::collections::HashMap;

use tracing::{info, instrument, warn};

use bookstore_core::{AccountId, ItemId, OrderId, OrderStatus, Price};

use super::CommerceError;
use crate::db::{CatalogRepository, Database, OrderRepository, Transaction};
use crate::models::{Order, OrderLineView, OrderSummary};

/// Order history and the `active -> complete` state machine.
pub struct OrderLifecycle<'a, D> {
    db: &'a D,
}

impl<'a, D: Database> OrderLifecycle<'a, D> {
    /// Create a new lifecycle service.
    #[must_use]
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Orders of an account with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the query fails.
    pub async fn list(
        &self,
        account_id: AccountId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, CommerceError> {
        let mut tx = self.db.begin().await?;

        let orders = tx.orders(account_id, status).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let lines = tx.order_lines(&order_ids).await?;

        let mut item_ids: Vec<ItemId> = lines.iter().map(|l| l.item_id).collect();
        item_ids.sort_unstable_by_key(ItemId::as_i32);
        item_ids.dedup();
        let items: HashMap<ItemId, _> = tx
            .items(&item_ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut by_order: HashMap<OrderId, Vec<OrderLineView>> = HashMap::new();
        for line in lines {
            let item = items.get(&line.item_id);
            by_order
                .entry(line.order_id)
                .or_default()
                .push(OrderLineView {
                    item_id: line.item_id,
                    title: item.map(|i| i.title.clone()),
                    author: item.map(|i| i.author.clone()),
                    cover: item.and_then(|i| i.cover.clone()),
                    quantity: line.quantity,
                    price_snapshot: line.price_snapshot,
                });
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = by_order.remove(&order.id).unwrap_or_default();
                let total: Price = lines.iter().map(|l| l.price_snapshot).sum();
                OrderSummary {
                    order,
                    lines,
                    total,
                }
            })
            .collect())
    }

    /// Move an order of `account_id` to `to`.
    ///
    /// The order row stays locked until the change commits, so two
    /// concurrent transitions cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::OrderNotFound` if the account has no such order.
    /// Returns `CommerceError::InvalidTransition` if the lifecycle forbids the move.
    #[instrument(skip(self), fields(account_id = %account_id, order_id = %order_id))]
    pub async fn transition(
        &self,
        account_id: AccountId,
        order_id: OrderId,
        to: OrderStatus,
    ) -> Result<Order, CommerceError> {
        let mut tx = self.db.begin().await?;

        let mut order = tx
            .order_for_update(account_id, order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(to) {
            warn!(from = %order.status, to = %to, "order transition rejected");
            return Err(CommerceError::InvalidTransition {
                order_id,
                from: order.status,
                to,
            });
        }

        tx.set_order_status(order_id, to).await?;
        tx.commit().await?;

        info!(from = %order.status, to = %to, "order status changed");
        order.status = to;
        Ok(order)
    }

    /// Mark an active order as received by the customer.
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::transition`].
    pub async fn mark_received(
        &self,
        account_id: AccountId,
        order_id: OrderId,
    ) -> Result<Order, CommerceError> {
        self.transition(account_id, order_id, OrderStatus::Complete)
            .await
    }
}
