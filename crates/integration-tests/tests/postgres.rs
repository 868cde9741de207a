//! The cart, checkout and review flows against `PostgreSQL`.
//!
//! These tests require a migrated database:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/bookstore_test bookstore-cli migrate
//! DATABASE_URL=postgres://localhost/bookstore_test \
//!     cargo test -p bookstore-integration-tests --test postgres -- --ignored
//! ```
//!
//! Each test creates its own items and uses its own account ID, so they can
//! share a database and run in parallel.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicI32, Ordering};

use secrecy::SecretString;

use bookstore_core::{AccountId, OrderStatus, Score};
use bookstore_integration_tests::{Book, shelve, store_pickup};
use bookstore_storefront::db::{self, PgDatabase};
use bookstore_storefront::models::{NewItem, PickupStore};
use bookstore_storefront::services::{
    AccountCart, Cart, CartService, CatalogService, CommerceError, OrderLifecycle, OrderService,
    ReviewService,
};

async fn database() -> PgDatabase {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url), 5)
        .await
        .expect("Failed to connect to database");
    PgDatabase::new(pool)
}

/// Account IDs unlikely to collide with earlier runs.
fn fresh_account() -> AccountId {
    static NEXT: AtomicI32 = AtomicI32::new(0);
    let base = i32::try_from(std::process::id() % 100_000).unwrap() * 1_000;
    AccountId::new(base + NEXT.fetch_add(1, Ordering::Relaxed))
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_pg_cart_scenario() {
    let db = database().await;
    let ids = shelve(&db, &[Book::new("Dune", "10.00", 3)]).await;
    let cart = Cart::Account(AccountCart::new(fresh_account()));
    let service = CartService::new(&db);

    assert_eq!(service.adjust(&cart, ids[0], 2).await.unwrap(), 2);
    assert!(matches!(
        service.adjust(&cart, ids[0], 2).await.unwrap_err(),
        CommerceError::OutOfStock { .. }
    ));
    assert_eq!(service.adjust(&cart, ids[0], -5).await.unwrap(), 0);
    assert!(service.snapshot(&cart).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_pg_checkout_and_lifecycle() {
    let db = database().await;
    let account = fresh_account();
    let ids = shelve(
        &db,
        &[Book::new("Dune", "10.00", 5), Book::new("Emma", "4.50", 3)],
    )
    .await;
    let cart = Cart::Account(AccountCart::new(account));
    let carts = CartService::new(&db);
    carts.adjust(&cart, ids[0], 2).await.unwrap();
    carts.adjust(&cart, ids[1], 3).await.unwrap();

    let stores = PickupStore::defaults();
    let snapshot = carts.snapshot(&cart).await.unwrap();
    let order = OrderService::new(&db, &stores)
        .commit(account, &snapshot, &store_pickup())
        .await
        .unwrap();

    assert!(carts.snapshot(&cart).await.unwrap().is_empty());
    let catalog = CatalogService::new(&db);
    assert_eq!(catalog.item(ids[0]).await.unwrap().available, 3);
    assert_eq!(catalog.item(ids[1]).await.unwrap().available, 0);

    let lifecycle = OrderLifecycle::new(&db);
    let history = lifecycle.list(account, None).await.unwrap();
    assert_eq!(history[0].lines.len(), 2);
    assert_eq!(history[0].total.to_string(), "33.50");

    let done = lifecycle.mark_received(account, order.id).await.unwrap();
    assert_eq!(done.status, OrderStatus::Complete);
    assert!(matches!(
        lifecycle.mark_received(account, order.id).await.unwrap_err(),
        CommerceError::InvalidTransition { .. }
    ));
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_pg_checkout_rolls_back_on_shortage() {
    let db = database().await;
    let account = fresh_account();
    let ids = shelve(
        &db,
        &[Book::new("Dune", "10.00", 5), Book::new("Emma", "4.50", 3)],
    )
    .await;
    let cart = Cart::Account(AccountCart::new(account));
    let carts = CartService::new(&db);
    carts.adjust(&cart, ids[0], 2).await.unwrap();
    carts.adjust(&cart, ids[1], 3).await.unwrap();
    let snapshot = carts.snapshot(&cart).await.unwrap();

    let catalog = CatalogService::new(&db);
    catalog.restock(ids[1], 2).await.unwrap();

    let stores = PickupStore::defaults();
    assert!(
        OrderService::new(&db, &stores)
            .commit(account, &snapshot, &store_pickup())
            .await
            .is_err()
    );
    assert_eq!(catalog.item(ids[0]).await.unwrap().available, 5);
    assert_eq!(carts.snapshot(&cart).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_pg_duplicate_review() {
    let db = database().await;
    let account = fresh_account();
    let ids = shelve(&db, &[Book::new("Dune", "10.00", 1)]).await;
    let reviews = ReviewService::new(&db);

    reviews
        .submit(account, ids[0], Score::new(5).unwrap(), None)
        .await
        .unwrap();
    assert!(matches!(
        reviews
            .submit(account, ids[0], Score::new(2).unwrap(), None)
            .await
            .unwrap_err(),
        CommerceError::AlreadyReviewed { .. }
    ));

    let rating = CatalogService::new(&db)
        .item(ids[0])
        .await
        .unwrap()
        .item
        .rating;
    assert_eq!(rating.count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_pg_concurrent_reviews_are_not_lost() {
    let db = database().await;
    let ids = shelve(&db, &[Book::new("Dune", "10.00", 1)]).await;
    let scores = [5, 1, 4, 2, 3, 5, 1, 4, 2, 3, 5, 1, 4, 2, 3, 5, 1, 4, 2, 3];

    let tasks: Vec<_> = scores
        .iter()
        .map(|&value| {
            let db = db.clone();
            let account = fresh_account();
            let item_id = ids[0];
            tokio::spawn(async move {
                ReviewService::new(&db)
                    .submit(account, item_id, Score::new(value).unwrap(), None)
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let rating = CatalogService::new(&db)
        .item(ids[0])
        .await
        .unwrap()
        .item
        .rating;
    assert_eq!(rating.count, 20);
    assert!((rating.average.unwrap() - 3.0).abs() < 1e-9);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_pg_checkout_keeps_lines_added_after_snapshot() {
    let db = database().await;
    let account = fresh_account();
    let ids = shelve(
        &db,
        &[Book::new("Dune", "10.00", 5), Book::new("Emma", "4.50", 3)],
    )
    .await;
    let cart = Cart::Account(AccountCart::new(account));
    let carts = CartService::new(&db);
    carts.adjust(&cart, ids[0], 1).await.unwrap();
    let snapshot = carts.snapshot(&cart).await.unwrap();
    carts.adjust(&cart, ids[1], 2).await.unwrap();

    let stores = PickupStore::defaults();
    OrderService::new(&db, &stores)
        .commit(account, &snapshot, &store_pickup())
        .await
        .unwrap();

    let left = carts.snapshot(&cart).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].item_id, ids[1]);
    assert_eq!(left[0].quantity, 2);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_pg_search_and_reprice() {
    let db = database().await;
    let account = fresh_account();
    let title = format!("Zx{}_Quixotic%", account.as_i32());
    let item = CatalogService::new(&db)
        .add_item(
            &NewItem {
                title: title.clone(),
                author: "Cervantes".to_owned(),
                year: None,
                price: "10.00".parse().unwrap(),
                cover: None,
                description: None,
            },
            2,
        )
        .await
        .unwrap();

    let catalog = CatalogService::new(&db);
    let found = catalog.search(&title.to_uppercase()).await.unwrap();
    assert!(found.iter().any(|i| i.id == item.id));
    // `%` and `_` match literally.
    let wildcard = format!("Zx{}%Quixotic", account.as_i32());
    assert!(catalog.search(&wildcard).await.unwrap().is_empty());

    let cart = Cart::Account(AccountCart::new(account));
    let carts = CartService::new(&db);
    carts.adjust(&cart, item.id, 2).await.unwrap();
    let snapshot = carts.snapshot(&cart).await.unwrap();
    let stores = PickupStore::defaults();
    OrderService::new(&db, &stores)
        .commit(account, &snapshot, &store_pickup())
        .await
        .unwrap();

    catalog
        .set_price(item.id, "99.00".parse().unwrap())
        .await
        .unwrap();
    let history = OrderLifecycle::new(&db).list(account, None).await.unwrap();
    assert_eq!(history[0].lines[0].price_snapshot.to_string(), "20.00");
}
