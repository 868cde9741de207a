//! Checkout: turning a cart snapshot into an order.

use chrono::Utc;
use tracing::{info, instrument, warn};

use bookstore_core::AccountId;

use super::{AccountCart, CartStore, CommerceError, StockLedger};
use crate::db::{CatalogRepository, Database, OrderRepository, Transaction};
use crate::models::{
    CartLine, CartLineView, DeliveryAddress, NewOrder, Order, OrderLine, PickupStore,
};

/// Order placement.
pub struct OrderService<'a, D> {
    db: &'a D,
    pickup_stores: &'a [PickupStore],
}

impl<'a, D: Database> OrderService<'a, D> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(db: &'a D, pickup_stores: &'a [PickupStore]) -> Self {
        Self { db, pickup_stores }
    }

    /// Place an order for every line of `snapshot`.
    ///
    /// Runs as one transaction: the order, its lines, the stock decrements
    /// and the settling of the account cart are applied together or not at
    /// all. Each line is charged the item's price at this moment.
    ///
    /// Only the ordered quantities leave the cart. Lines added, or units
    /// added to a line, after the snapshot was taken stay in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::CheckoutEmptyCart` if the snapshot has no lines.
    /// Returns `CommerceError::InvalidAddress` if the address cannot be resolved.
    /// Returns `CommerceError::ItemNotFound` if an item left the catalog.
    /// Returns `CommerceError::OutOfStock` if any line exceeds current stock.
    #[instrument(skip(self, snapshot, address), fields(account_id = %account_id, lines = snapshot.len()))]
    pub async fn commit(
        &self,
        account_id: AccountId,
        snapshot: &[CartLineView],
        address: &DeliveryAddress,
    ) -> Result<Order, CommerceError> {
        let lines: Vec<&CartLineView> = snapshot.iter().filter(|l| l.quantity > 0).collect();
        if lines.is_empty() {
            return Err(CommerceError::CheckoutEmptyCart);
        }
        let address = address.resolve(self.pickup_stores)?;

        let cart = AccountCart::new(account_id);
        let mut tx = self.db.begin().await?;
        let order = tx
            .insert_order(&NewOrder {
                account_id,
                created_at: Utc::now(),
                address,
            })
            .await?;

        for line in lines {
            let item = tx
                .item(line.item_id)
                .await?
                .ok_or(CommerceError::ItemNotFound(line.item_id))?;

            let available = StockLedger::new(&mut tx).available(item.id).await?;
            if line.quantity > available {
                warn!(
                    item_id = %item.id,
                    requested = line.quantity,
                    available,
                    "checkout aborted: insufficient stock"
                );
                return Err(CommerceError::OutOfStock {
                    item_id: item.id,
                    requested: i64::from(line.quantity),
                    available,
                });
            }

            tx.insert_order_line(&OrderLine {
                order_id: order.id,
                item_id: item.id,
                quantity: line.quantity,
                price_snapshot: item.price.times(line.quantity),
            })
            .await?;

            StockLedger::new(&mut tx)
                .reserve(item.id, line.quantity)
                .await?;

            let remaining = cart.quantity(&mut tx, item.id).await? - line.quantity;
            if remaining > 0 {
                let rest = CartLine {
                    item_id: item.id,
                    quantity: remaining,
                };
                cart.upsert(&mut tx, rest).await?;
            } else {
                cart.remove(&mut tx, item.id).await?;
            }
        }

        tx.commit().await?;

        info!(order_id = %order.id, "order placed");
        Ok(order)
    }
}
