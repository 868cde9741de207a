//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Guest and account carts bounded by stock
//! - `order` - Checkout into an immutable order
//! - `lifecycle` - Order history and status transitions
//! - `rating` - Reviews and incremental item ratings
//! - `catalog` - Item reads, search, best sellers, pricing and restocking
//! - `stock` - The stock ledger used by all of the above
//!
//! Services borrow a [`Database`](crate::db::Database) and open one
//! transaction per operation.

pub mod cart;
pub mod catalog;
mod error;
pub mod lifecycle;
pub mod order;
pub mod rating;
pub mod stock;

pub use cart::{AccountCart, Cart, CartChange, CartService, CartStore, GuestCart};
pub use catalog::{CatalogService, DEFAULT_TOP_SELLERS, MAX_SEARCH_RESULTS};
pub use error::CommerceError;
pub use lifecycle::OrderLifecycle;
pub use order::OrderService;
pub use rating::{RatingAggregator, ReviewService};
pub use stock::StockLedger;
