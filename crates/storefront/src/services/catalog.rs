//! Catalog reads and stock administration.

use tracing::{info, instrument};

use bookstore_core::{ItemId, Price};

use super::{CommerceError, StockLedger};
use crate::db::{CatalogRepository, Database, RepositoryError, Transaction};
use crate::models::{Item, ItemAvailability, NewItem};

/// Number of items on the best-seller shelf.
pub const DEFAULT_TOP_SELLERS: usize = 3;

/// Most items returned by one search.
pub const MAX_SEARCH_RESULTS: usize = 50;

/// Catalog operations.
pub struct CatalogService<'a, D> {
    db: &'a D,
}

impl<'a, D: Database> CatalogService<'a, D> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// An item with its current stock.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    pub async fn item(&self, item_id: ItemId) -> Result<ItemAvailability, CommerceError> {
        let mut tx = self.db.begin().await?;
        let item = tx
            .item(item_id)
            .await?
            .ok_or(CommerceError::ItemNotFound(item_id))?;
        let available = StockLedger::new(&mut tx).available(item_id).await?;
        Ok(ItemAvailability { item, available })
    }

    /// In-stock items ranked by units sold, then by rating.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the query fails.
    pub async fn top_sellers(&self, limit: usize) -> Result<Vec<Item>, CommerceError> {
        let mut tx = self.db.begin().await?;
        Ok(tx.top_items(limit).await?)
    }

    /// Items whose title or author contains `query`, ignoring case.
    ///
    /// Surrounding whitespace is ignored and a blank query finds nothing.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Item>, CommerceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.db.begin().await?;
        Ok(tx.search_items(query, MAX_SEARCH_RESULTS).await?)
    }

    /// Add an item to the catalog with an initial stock.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the insert fails.
    #[instrument(skip(self, item), fields(title = %item.title))]
    pub async fn add_item(&self, item: &NewItem, stock: i32) -> Result<Item, CommerceError> {
        let mut tx = self.db.begin().await?;
        let item = tx.insert_item(item).await?;
        StockLedger::new(&mut tx).restock(item.id, stock).await?;
        tx.commit().await?;

        info!(item_id = %item.id, stock, "item added");
        Ok(item)
    }

    /// Set the stock of an existing item.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    pub async fn restock(&self, item_id: ItemId, quantity: i32) -> Result<(), CommerceError> {
        let mut tx = self.db.begin().await?;
        StockLedger::new(&mut tx).restock(item_id, quantity).await?;
        tx.commit().await?;

        info!(item_id = %item_id, quantity, "item restocked");
        Ok(())
    }

    /// Change the unit price of an item.
    ///
    /// Orders already placed keep the line totals they were placed with.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    #[instrument(skip(self))]
    pub async fn set_price(&self, item_id: ItemId, price: Price) -> Result<(), CommerceError> {
        let mut tx = self.db.begin().await?;
        tx.set_price(item_id, price).await.map_err(|e| match e {
            RepositoryError::NotFound => CommerceError::ItemNotFound(item_id),
            other => CommerceError::Repository(other),
        })?;
        tx.commit().await?;

        info!(item_id = %item_id, price = %price, "item repriced");
        Ok(())
    }
}
