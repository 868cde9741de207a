//! Review submission and the incremental rating.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

use bookstore_core::{AccountId, ItemId, Score};
use bookstore_integration_tests::{Book, shelve};
use bookstore_storefront::db::MemoryDatabase;
use bookstore_storefront::services::{CatalogService, CommerceError, ReviewService};

fn score(value: i64) -> Score {
    Score::new(value).unwrap()
}

#[tokio::test]
async fn test_rating_follows_reviews() {
    let db = MemoryDatabase::new();
    let ids = shelve(&db, &[Book::new("Dune", "10.00", 1)]).await;
    let reviews = ReviewService::new(&db);

    for (account, value) in [(1, 5), (2, 3), (3, 4)] {
        reviews
            .submit(AccountId::new(account), ids[0], score(value), None)
            .await
            .unwrap();
    }

    let item = CatalogService::new(&db).item(ids[0]).await.unwrap().item;
    assert_eq!(item.rating.count, 3);
    assert!((item.rating.average.unwrap() - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_rating_is_order_independent() {
    let db = MemoryDatabase::new();
    let ids = shelve(
        &db,
        &[Book::new("Dune", "10.00", 1), Book::new("Emma", "4.50", 1)],
    )
    .await;
    let reviews = ReviewService::new(&db);

    for (account, value) in [(1, 5), (2, 3), (3, 4)] {
        reviews
            .submit(AccountId::new(account), ids[0], score(value), None)
            .await
            .unwrap();
    }
    for (account, value) in [(1, 3), (2, 4), (3, 5)] {
        reviews
            .submit(AccountId::new(account), ids[1], score(value), None)
            .await
            .unwrap();
    }

    let catalog = CatalogService::new(&db);
    let a = catalog.item(ids[0]).await.unwrap().item.rating;
    let b = catalog.item(ids[1]).await.unwrap().item.rating;
    assert_eq!(a.count, b.count);
    assert!((a.average.unwrap() - b.average.unwrap()).abs() < 1e-9);
}

#[tokio::test]
async fn test_duplicate_review_leaves_rating_unchanged() {
    let db = MemoryDatabase::new();
    let ids = shelve(&db, &[Book::new("Dune", "10.00", 1)]).await;
    let reviews = ReviewService::new(&db);
    let account = AccountId::new(1);

    reviews
        .submit(account, ids[0], score(5), Some("Loved it".to_owned()))
        .await
        .unwrap();
    let err = reviews
        .submit(account, ids[0], score(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::AlreadyReviewed { .. }));

    let rating = CatalogService::new(&db).item(ids[0]).await.unwrap().item.rating;
    assert_eq!(rating.count, 1);
    assert_eq!(rating.average, Some(5.0));
    assert_eq!(reviews.list(ids[0]).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_review_unknown_item() {
    let db = MemoryDatabase::new();
    let err = ReviewService::new(&db)
        .submit(AccountId::new(1), ItemId::new(404), score(4), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::ItemNotFound(_)));
}

#[tokio::test]
async fn test_reviews_listed_newest_first() {
    let db = MemoryDatabase::new();
    let ids = shelve(&db, &[Book::new("Dune", "10.00", 1)]).await;
    let reviews = ReviewService::new(&db);

    reviews
        .submit(AccountId::new(1), ids[0], score(2), Some("  ".to_owned()))
        .await
        .unwrap();
    let latest = reviews
        .submit(AccountId::new(2), ids[0], score(4), Some("Great".to_owned()))
        .await
        .unwrap();

    let listed = reviews.list(ids[0]).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, latest.id);
    assert_eq!(listed[1].body, None, "blank bodies are dropped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reviews_all_count() {
    let db = MemoryDatabase::new();
    let ids = shelve(&db, &[Book::new("Dune", "10.00", 1)]).await;

    let tasks: Vec<_> = (1..=20)
        .map(|account| {
            let db = db.clone();
            let item_id = ids[0];
            tokio::spawn(async move {
                ReviewService::new(&db)
                    .submit(AccountId::new(account), item_id, score(4), None)
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let rating = CatalogService::new(&db).item(ids[0]).await.unwrap().item.rating;
    assert_eq!(rating.count, 20);
    assert_eq!(rating.average, Some(4.0));
}
