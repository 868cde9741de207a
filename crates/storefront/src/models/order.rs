//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{AccountId, ItemId, OrderId, OrderStatus, Price};

/// A placed order. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    /// Resolved delivery address.
    pub address: String,
}

/// Fields needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub address: String,
}

/// One purchased item of an order, frozen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: i32,
    /// Unit price at checkout multiplied by `quantity`.
    pub price_snapshot: Price,
}

/// An order line joined with display fields of its item.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineView {
    pub item_id: ItemId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub cover: Option<String>,
    pub quantity: i32,
    pub price_snapshot: Price,
}

/// An order with its lines and total, as shown in order history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLineView>,
    /// Sum of the lines' price snapshots.
    pub total: Price,
}
