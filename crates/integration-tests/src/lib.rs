//! Integration tests for the bookstore.
//!
//! # Running Tests
//!
//! ```bash
//! # Service and HTTP tests (in-memory storage)
//! cargo test -p bookstore-integration-tests
//!
//! # Including the PostgreSQL tests
//! DATABASE_URL=postgres://localhost/bookstore_test \
//!     cargo test -p bookstore-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart` - cart adjustments, guest carts and the login merge
//! - `checkout` - order placement and stock accounting
//! - `orders` - order history and status transitions
//! - `reviews` - review submission and rating aggregation
//! - `http` - the JSON routes end to end
//! - `postgres` - the same flows against a real database

use std::str::FromStr;
use std::sync::Arc;

use secrecy::SecretString;
use tower_sessions::{MemoryStore, Session};
use url::Url;

use bookstore_core::{ItemId, Price};
use bookstore_storefront::config::StorefrontConfig;
use bookstore_storefront::db::Database;
use bookstore_storefront::models::{DeliveryAddress, NewItem, PickupStore};
use bookstore_storefront::services::CatalogService;

/// A book to put on the shelf before a test.
#[derive(Debug, Clone, Copy)]
pub struct Book {
    pub title: &'static str,
    pub price: &'static str,
    pub stock: i32,
}

impl Book {
    #[must_use]
    pub const fn new(title: &'static str, price: &'static str, stock: i32) -> Self {
        Self {
            title,
            price,
            stock,
        }
    }
}

/// Insert `books` with their stock and return their IDs in the same order.
///
/// # Panics
///
/// Panics if a price does not parse or an insert fails.
pub async fn shelve<D: Database>(db: &D, books: &[Book]) -> Vec<ItemId> {
    let catalog = CatalogService::new(db);
    let mut ids = Vec::with_capacity(books.len());
    for book in books {
        let item = catalog
            .add_item(
                &NewItem {
                    title: book.title.to_owned(),
                    author: format!("Author of {}", book.title),
                    year: None,
                    price: Price::from_str(book.price).expect("valid price"),
                    cover: None,
                    description: None,
                },
                book.stock,
            )
            .await
            .expect("failed to add item");
        ids.push(item.id);
    }
    ids
}

/// A fresh session backed by an in-memory store, as a first-time visitor has.
#[must_use]
pub fn guest_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// Pickup at the first built-in store.
#[must_use]
pub fn store_pickup() -> DeliveryAddress {
    DeliveryAddress::StorePickup {
        store: PickupStore::defaults()
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_default(),
    }
}

/// Configuration for an app that never touches the network.
///
/// # Panics
///
/// Panics if the hard-coded addresses do not parse.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/bookstore_test"),
        host: "127.0.0.1".parse().expect("valid host"),
        port: 3000,
        base_url: Url::parse("http://localhost:3000").expect("valid url"),
        max_connections: 2,
        pickup_stores: PickupStore::defaults(),
        log_json: false,
    }
}
