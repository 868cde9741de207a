//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{AccountId, ItemId, ReviewId, Score};

/// A persisted review. At most one exists per account and item.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub account_id: AccountId,
    pub item_id: ItemId,
    pub score: Score,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub account_id: AccountId,
    pub item_id: ItemId,
    pub score: Score,
    pub body: Option<String>,
}
