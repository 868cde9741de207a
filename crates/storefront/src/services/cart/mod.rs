//! Cart service.
//!
//! One quantity-adjustment contract over guest and account carts. Every
//! mutation is checked against the stock ledger: a cart line never exceeds
//! the stock that was available when it was written and never drops below
//! one unit (reaching zero removes the line).

mod store;

pub use store::{AccountCart, Cart, CartChange, CartStore, GuestCart};

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use bookstore_core::{AccountId, ItemId, Price};

use super::{CommerceError, StockLedger};
use crate::db::{CatalogRepository, Database, Transaction};
use crate::models::{CartLine, CartLineView};

/// Decide the quantity a line ends up with after adding `delta`.
///
/// Returns the new quantity, where 0 means the line is removed.
///
/// # Errors
///
/// Returns `CommerceError::OutOfStock` if the proposed quantity exceeds
/// `available`, even when `delta` is negative.
pub fn next_quantity(
    item_id: ItemId,
    current: i32,
    delta: i64,
    available: i32,
) -> Result<i32, CommerceError> {
    let proposed = i64::from(current).saturating_add(delta);
    if proposed > i64::from(available) {
        return Err(CommerceError::OutOfStock {
            item_id,
            requested: proposed,
            available,
        });
    }
    if proposed <= 0 {
        return Ok(0);
    }
    // proposed <= available, so it fits
    Ok(i32::try_from(proposed).unwrap_or(available))
}

/// Cart operations.
pub struct CartService<'a, D> {
    db: &'a D,
}

impl<'a, D: Database> CartService<'a, D> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Add `delta` units of an item (negative to take units away).
    ///
    /// Returns the resulting quantity; 0 means the line was removed.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ItemNotFound` if the item does not exist.
    /// Returns `CommerceError::OutOfStock` if the result would exceed the
    /// available stock; the cart is left unchanged.
    #[instrument(skip(self, cart), fields(item_id = %item_id, account_id = ?cart.account_id()))]
    pub async fn adjust(
        &self,
        cart: &Cart,
        item_id: ItemId,
        delta: i64,
    ) -> Result<i32, CommerceError> {
        let mut tx = self.db.begin().await?;

        if tx.item(item_id).await?.is_none() {
            return Err(CommerceError::ItemNotFound(item_id));
        }

        let current = cart.quantity(&mut tx, item_id).await?;
        let available = StockLedger::new(&mut tx).available(item_id).await?;

        let quantity = match next_quantity(item_id, current, delta, available) {
            Ok(quantity) => quantity,
            Err(e) => {
                warn!(current, available, "cart adjustment rejected: {e}");
                return Err(e);
            }
        };

        let change = if quantity == 0 {
            CartChange::Remove(item_id)
        } else {
            CartChange::Set(CartLine { item_id, quantity })
        };
        cart.settle(tx, change).await?;

        debug!(current, quantity, "cart line adjusted");
        Ok(quantity)
    }

    /// Drop an item from the cart whatever its quantity.
    ///
    /// Works for items that have since left the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` or `CommerceError::Session` if the
    /// cart cannot be written.
    #[instrument(skip(self, cart), fields(item_id = %item_id, account_id = ?cart.account_id()))]
    pub async fn remove_all(&self, cart: &Cart, item_id: ItemId) -> Result<(), CommerceError> {
        let tx = self.db.begin().await?;
        cart.settle(tx, CartChange::Remove(item_id)).await?;
        debug!("cart line removed");
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` or `CommerceError::Session` if the
    /// cart cannot be written.
    #[instrument(skip(self, cart), fields(account_id = ?cart.account_id()))]
    pub async fn clear(&self, cart: &Cart) -> Result<(), CommerceError> {
        let tx = self.db.begin().await?;
        cart.settle(tx, CartChange::Clear).await?;
        debug!("cart cleared");
        Ok(())
    }

    /// Cart lines joined with their items, in cart order.
    ///
    /// Lines whose item no longer exists are left out.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` or `CommerceError::Session` if the
    /// cart cannot be read.
    pub async fn snapshot(&self, cart: &Cart) -> Result<Vec<CartLineView>, CommerceError> {
        let mut tx = self.db.begin().await?;
        let lines = cart.lines(&mut tx).await?;
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ItemId> = lines.iter().map(|line| line.item_id).collect();
        let items: HashMap<ItemId, _> = tx
            .items(&ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        Ok(lines
            .into_iter()
            .filter_map(|line| {
                let item = items.get(&line.item_id)?;
                Some(CartLineView {
                    item_id: item.id,
                    title: item.title.clone(),
                    author: item.author.clone(),
                    cover: item.cover.clone(),
                    price: item.price,
                    quantity: line.quantity,
                    line_total: item.price.times(line.quantity),
                })
            })
            .collect())
    }

    /// Sum of line totals.
    ///
    /// With a non-empty `selected` list only those items count; `None` or an
    /// empty list means the whole snapshot.
    #[must_use]
    #[allow(clippy::unused_self)] // kept on the service so callers never name `D`
    pub fn total(&self, snapshot: &[CartLineView], selected: Option<&[ItemId]>) -> Price {
        match selected {
            Some(ids) if !ids.is_empty() => snapshot
                .iter()
                .filter(|line| ids.contains(&line.item_id))
                .map(|line| line.line_total)
                .sum(),
            _ => snapshot.iter().map(|line| line.line_total).sum(),
        }
    }

    /// Fold a guest cart into an account cart after login.
    ///
    /// Quantities of the same item are added and capped by the current
    /// stock; an account line that already exceeds stock is kept as is.
    /// Items that left the catalog are dropped. The guest cart is emptied
    /// once the account cart is committed.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` or `CommerceError::Session` if
    /// either cart cannot be read or written.
    #[instrument(skip(self, guest), fields(account_id = %account_id))]
    pub async fn merge_on_login(
        &self,
        guest: &GuestCart,
        account_id: AccountId,
    ) -> Result<(), CommerceError> {
        let guest_lines = guest.load().await?;
        if guest_lines.is_empty() {
            return Ok(());
        }

        let account = AccountCart::new(account_id);
        let mut tx = self.db.begin().await?;

        let mut merged = 0_usize;
        for line in &guest_lines {
            if tx.item(line.item_id).await?.is_none() {
                continue;
            }
            let current = account.quantity(&mut tx, line.item_id).await?;
            let available = StockLedger::new(&mut tx).available(line.item_id).await?;
            let quantity = current
                .saturating_add(line.quantity)
                .min(available)
                .max(current);

            if quantity > current {
                account
                    .upsert(
                        &mut tx,
                        CartLine {
                            item_id: line.item_id,
                            quantity,
                        },
                    )
                    .await?;
                merged += 1;
            }
        }

        tx.commit().await?;
        guest.empty().await?;

        info!(
            guest_lines = guest_lines.len(),
            merged, "guest cart merged into account cart"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::db::{MemoryDatabase, StockRepository};
    use crate::models::NewItem;

    const ITEM: ItemId = ItemId::new(1);

    async fn stocked(quantity: i32) -> (MemoryDatabase, ItemId) {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        let item = tx
            .insert_item(&NewItem {
                title: "Dune".to_owned(),
                author: "Frank Herbert".to_owned(),
                year: None,
                price: "10.00".parse().unwrap(),
                cover: None,
                description: None,
            })
            .await
            .unwrap();
        tx.set_stock(item.id, quantity).await.unwrap();
        tx.commit().await.unwrap();
        (db, item.id)
    }

    fn guest() -> GuestCart {
        GuestCart::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    #[test]
    fn test_next_quantity_within_stock() {
        assert_eq!(next_quantity(ITEM, 0, 2, 3).unwrap(), 2);
        assert_eq!(next_quantity(ITEM, 2, 1, 3).unwrap(), 3);
    }

    #[test]
    fn test_next_quantity_over_stock_fails() {
        let err = next_quantity(ITEM, 2, 2, 3).unwrap_err();
        assert!(matches!(
            err,
            CommerceError::OutOfStock {
                requested: 4,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_next_quantity_removes_at_zero_or_below() {
        assert_eq!(next_quantity(ITEM, 2, -2, 3).unwrap(), 0);
        assert_eq!(next_quantity(ITEM, 2, -5, 3).unwrap(), 0);
        assert_eq!(next_quantity(ITEM, 2, i64::MIN, 0).unwrap(), 0);
    }

    #[test]
    fn test_next_quantity_decrement_above_shrunk_stock_fails() {
        // stock dropped to 1 while the cart held 3
        assert!(next_quantity(ITEM, 3, -1, 1).is_err());
    }

    #[test]
    fn test_next_quantity_saturates() {
        assert!(next_quantity(ITEM, i32::MAX, i64::MAX, i32::MAX).is_err());
    }

    #[test]
    fn test_total_with_and_without_selection() {
        let line = |id: i32, total: &str| CartLineView {
            item_id: ItemId::new(id),
            title: String::new(),
            author: String::new(),
            cover: None,
            price: total.parse().unwrap(),
            quantity: 1,
            line_total: total.parse().unwrap(),
        };
        let snapshot = vec![line(1, "10.00"), line(2, "2.50")];
        let db = crate::db::MemoryDatabase::new();
        let service = CartService::new(&db);

        assert_eq!(
            service.total(&snapshot, None),
            "12.50".parse::<Price>().unwrap()
        );
        assert_eq!(
            service.total(&snapshot, Some(&[])),
            "12.50".parse::<Price>().unwrap()
        );
        assert_eq!(
            service.total(&snapshot, Some(&[ItemId::new(2)])),
            "2.50".parse::<Price>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_guest_cart_untouched_when_commit_fails() {
        let (db, item_id) = stocked(3).await;
        let guest = guest();
        let cart = Cart::Guest(guest.clone());
        let service = CartService::new(&db);
        service.adjust(&cart, item_id, 1).await.unwrap();

        db.fail_commits();
        assert!(service.adjust(&cart, item_id, 1).await.is_err());
        assert!(service.remove_all(&cart, item_id).await.is_err());
        assert!(service.clear(&cart).await.is_err());

        let lines = guest.load().await.unwrap();
        assert_eq!(lines, [CartLine { item_id, quantity: 1 }]);
    }

    #[tokio::test]
    async fn test_account_cart_untouched_when_commit_fails() {
        let (db, item_id) = stocked(3).await;
        let cart = Cart::Account(AccountCart::new(AccountId::new(7)));
        let service = CartService::new(&db);
        service.adjust(&cart, item_id, 2).await.unwrap();

        db.fail_commits();
        assert!(service.adjust(&cart, item_id, -1).await.is_err());
        assert!(service.clear(&cart).await.is_err());

        let mut tx = db.begin().await.unwrap();
        assert_eq!(cart.quantity(&mut tx, item_id).await.unwrap(), 2);
    }
}
