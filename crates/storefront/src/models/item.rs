//! Catalog item domain types.

use serde::{Deserialize, Serialize};

use bookstore_core::{ItemId, Price, RatingSummary};

/// A sellable catalog item (a book).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    /// Unique item ID.
    pub id: ItemId,
    /// Title shown in listings.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Publication year, if known.
    pub year: Option<i32>,
    /// Unit price.
    pub price: Price,
    /// Cover image path or URL.
    pub cover: Option<String>,
    /// Long-form description.
    pub description: Option<String>,
    /// Running review mean and count.
    pub rating: RatingSummary,
}

/// Fields needed to insert a new item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub price: Price,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An item together with its current stock.
#[derive(Debug, Clone, Serialize)]
pub struct ItemAvailability {
    #[serde(flatten)]
    pub item: Item,
    /// Units available for purchase right now.
    pub available: i32,
}
