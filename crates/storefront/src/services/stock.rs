//! Stock ledger: the authoritative available quantity of each item.

use tracing::{instrument, warn};

use bookstore_core::ItemId;

use super::CommerceError;
use crate::db::{RepositoryError, StockRepository};

/// Stock reads and reservations inside one transaction.
pub struct StockLedger<'a, T> {
    tx: &'a mut T,
}

impl<'a, T: StockRepository> StockLedger<'a, T> {
    /// Create a ledger over an open transaction.
    #[must_use]
    pub const fn new(tx: &'a mut T) -> Self {
        Self { tx }
    }

    /// Units of an item available right now. Items without a stock record
    /// have none.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the query fails.
    pub async fn available(&mut self, item_id: ItemId) -> Result<i32, CommerceError> {
        Ok(self.tx.stock(item_id).await?.unwrap_or(0).max(0))
    }

    /// Take `quantity` units out of stock.
    ///
    /// Only call this inside a checkout transaction; the decrement becomes
    /// permanent when that transaction commits.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::OutOfStock` if fewer than `quantity` units are
    /// available at the moment of the update.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn reserve(&mut self, item_id: ItemId, quantity: i32) -> Result<(), CommerceError> {
        if self.tx.decrement_stock(item_id, quantity).await? {
            return Ok(());
        }

        let available = self.available(item_id).await?;
        warn!(requested = quantity, available, "stock reservation failed");
        Err(CommerceError::OutOfStock {
            item_id,
            requested: i64::from(quantity),
            available,
        })
    }

    /// Replace the stock of an item (restocking).
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn restock(&mut self, item_id: ItemId, quantity: i32) -> Result<(), CommerceError> {
        self.tx
            .set_stock(item_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::ItemNotFound(item_id),
                other => CommerceError::Repository(other),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{CatalogRepository, Database, MemoryDatabase};
    use crate::models::NewItem;

    async fn stocked(db: &MemoryDatabase, quantity: i32) -> ItemId {
        let mut tx = db.begin().await.unwrap();
        let item = tx
            .insert_item(&NewItem {
                title: "Dune".to_owned(),
                author: "Frank Herbert".to_owned(),
                year: Some(1965),
                price: "9.99".parse().unwrap(),
                cover: None,
                description: None,
            })
            .await
            .unwrap();
        StockLedger::new(&mut tx)
            .restock(item.id, quantity)
            .await
            .unwrap();
        crate::db::Transaction::commit(tx).await.unwrap();
        item.id
    }

    #[tokio::test]
    async fn test_missing_stock_record_reads_as_zero() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        assert_eq!(
            StockLedger::new(&mut tx)
                .available(ItemId::new(404))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_reserve_never_goes_negative() {
        let db = MemoryDatabase::new();
        let item = stocked(&db, 3).await;
        let mut tx = db.begin().await.unwrap();
        let mut ledger = StockLedger::new(&mut tx);

        ledger.reserve(item, 2).await.unwrap();
        let err = ledger.reserve(item, 2).await.unwrap_err();
        assert!(matches!(
            err,
            CommerceError::OutOfStock {
                requested: 2,
                available: 1,
                ..
            }
        ));
        assert_eq!(ledger.available(item).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_restock_unknown_item() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        assert!(matches!(
            StockLedger::new(&mut tx).restock(ItemId::new(7), 5).await,
            Err(CommerceError::ItemNotFound(_))
        ));
    }
}
