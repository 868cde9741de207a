//! Cart line types.

use serde::{Deserialize, Serialize};

use bookstore_core::{ItemId, Price};

/// One line of a cart: an item and a positive quantity.
///
/// Guest carts serialize a `Vec<CartLine>` into the session, account carts
/// keep one row per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub quantity: i32,
}

/// A cart line joined with the item fields needed for display and checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineView {
    pub item_id: ItemId,
    pub title: String,
    pub author: String,
    pub cover: Option<String>,
    /// Unit price at snapshot time.
    pub price: Price,
    pub quantity: i32,
    /// `price * quantity`.
    pub line_total: Price,
}
