//! Commerce error types.

use thiserror::Error;

use bookstore_core::{AccountId, ItemId, OrderId, OrderStatus};

use crate::db::RepositoryError;
use crate::models::AddressError;

/// Errors that can occur during cart, checkout, order and review operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The requested quantity exceeds the available stock.
    #[error("only {available} of item {item_id} available, {requested} requested")]
    OutOfStock {
        item_id: ItemId,
        requested: i64,
        available: i32,
    },

    /// The item does not exist in the catalog.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// The account already reviewed this item.
    #[error("account {account_id} already reviewed item {item_id}")]
    AlreadyReviewed {
        account_id: AccountId,
        item_id: ItemId,
    },

    /// The order status change is not allowed by the lifecycle.
    #[error("order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Checkout was attempted with no cart lines.
    #[error("cannot check out an empty cart")]
    CheckoutEmptyCart,

    /// The order does not exist or belongs to another account.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The delivery address could not be resolved.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// Reading or writing the guest cart in the session failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
