//! Reviews and the running rating of each item.

use tracing::{info, instrument};

use bookstore_core::{AccountId, ItemId, RatingSummary, Score};

use super::CommerceError;
use crate::db::{CatalogRepository, Database, RepositoryError, ReviewRepository, Transaction};
use crate::models::{NewReview, Review};

/// Folds review scores into an item's rating inside one transaction.
///
/// The stored mean is updated incrementally and never recomputed from the
/// reviews table.
pub struct RatingAggregator<'a, T> {
    tx: &'a mut T,
}

impl<'a, T: CatalogRepository> RatingAggregator<'a, T> {
    #[must_use]
    pub const fn new(tx: &'a mut T) -> Self {
        Self { tx }
    }

    /// Record one score for an item and return the updated summary.
    ///
    /// The item row stays locked until the transaction ends, so concurrent
    /// reviews of one item are folded in one after another.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    pub async fn record(
        &mut self,
        item_id: ItemId,
        score: Score,
    ) -> Result<RatingSummary, CommerceError> {
        let item = self
            .tx
            .item_for_update(item_id)
            .await?
            .ok_or(CommerceError::ItemNotFound(item_id))?;

        let rating = item.rating.record(score);
        self.tx.set_rating(item_id, rating).await?;
        Ok(rating)
    }
}

/// Review submission and listing.
pub struct ReviewService<'a, D> {
    db: &'a D,
}

impl<'a, D: Database> ReviewService<'a, D> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Store a review and fold its score into the item's rating.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    /// Returns `CommerceError::AlreadyReviewed` if the account already
    /// reviewed the item; the rating is left untouched.
    #[instrument(skip(self, body), fields(account_id = %account_id, item_id = %item_id))]
    pub async fn submit(
        &self,
        account_id: AccountId,
        item_id: ItemId,
        score: Score,
        body: Option<String>,
    ) -> Result<Review, CommerceError> {
        let mut tx = self.db.begin().await?;

        if tx.item_for_update(item_id).await?.is_none() {
            return Err(CommerceError::ItemNotFound(item_id));
        }
        if tx.review_exists(account_id, item_id).await? {
            return Err(CommerceError::AlreadyReviewed {
                account_id,
                item_id,
            });
        }

        let body = body.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
        let review = tx
            .insert_review(&NewReview {
                account_id,
                item_id,
                score,
                body,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CommerceError::AlreadyReviewed {
                    account_id,
                    item_id,
                },
                other => CommerceError::Repository(other),
            })?;

        let rating = RatingAggregator::new(&mut tx).record(item_id, score).await?;
        tx.commit().await?;

        info!(
            score = score.get(),
            average = rating.average,
            count = rating.count,
            "review recorded"
        );
        Ok(review)
    }

    /// Reviews of an item, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    pub async fn list(&self, item_id: ItemId) -> Result<Vec<Review>, CommerceError> {
        let mut tx = self.db.begin().await?;
        if tx.item(item_id).await?.is_none() {
            return Err(CommerceError::ItemNotFound(item_id));
        }
        Ok(tx.reviews(item_id).await?)
    }
}
