//! Cart backends.
//!
//! A guest cart lives in the visitor's session; an account cart is a set of
//! `cart_items` rows. Both expose the same [`CartStore`] contract so the cart
//! service never branches on who owns the cart.

use async_trait::async_trait;
use tower_sessions::Session;

use bookstore_core::{AccountId, ItemId};

use crate::db::{CartRepository, Transaction};
use crate::models::{CartLine, session_keys};
use crate::services::CommerceError;

/// One write to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// Insert or replace a line.
    Set(CartLine),
    /// Delete a line if present.
    Remove(ItemId),
    /// Delete every line.
    Clear,
}

/// Storage contract shared by guest and account carts.
///
/// Every method takes the open transaction of the calling operation. Guest
/// carts ignore it because their lines are kept in the session.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All lines of the cart.
    async fn lines<T: CartRepository>(&self, tx: &mut T) -> Result<Vec<CartLine>, CommerceError>;

    /// Quantity of one item, 0 if absent.
    async fn quantity<T: CartRepository>(
        &self,
        tx: &mut T,
        item_id: ItemId,
    ) -> Result<i32, CommerceError>;

    /// Insert or replace a line.
    async fn upsert<T: CartRepository>(
        &self,
        tx: &mut T,
        line: CartLine,
    ) -> Result<(), CommerceError>;

    /// Delete a line if present.
    async fn remove<T: CartRepository>(
        &self,
        tx: &mut T,
        item_id: ItemId,
    ) -> Result<(), CommerceError>;

    /// Delete every line.
    async fn clear<T: CartRepository>(&self, tx: &mut T) -> Result<(), CommerceError>;

    /// Write `change` and finish the operation's transaction.
    ///
    /// A failed commit leaves the cart untouched. By default the change goes
    /// through `tx` before the commit.
    async fn settle<Tx: Transaction>(
        &self,
        mut tx: Tx,
        change: CartChange,
    ) -> Result<(), CommerceError> {
        match change {
            CartChange::Set(line) => self.upsert(&mut tx, line).await?,
            CartChange::Remove(item_id) => self.remove(&mut tx, item_id).await?,
            CartChange::Clear => self.clear(&mut tx).await?,
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Cart of an anonymous visitor, stored under [`session_keys::GUEST_CART`].
///
/// Concurrent requests of the same visitor are not serialized; the last
/// session write wins.
#[derive(Debug, Clone)]
pub struct GuestCart {
    session: Session,
}

impl GuestCart {
    /// Wrap the visitor's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Lines currently stored in the session.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Session` if the session cannot be read.
    pub async fn load(&self) -> Result<Vec<CartLine>, CommerceError> {
        Ok(self
            .session
            .get::<Vec<CartLine>>(session_keys::GUEST_CART)
            .await?
            .unwrap_or_default())
    }

    /// Remove the cart from the session.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Session` if the session cannot be written.
    pub async fn empty(&self) -> Result<(), CommerceError> {
        self.save(Vec::new()).await
    }

    async fn apply(&self, change: CartChange) -> Result<(), CommerceError> {
        let mut lines = match change {
            CartChange::Clear => Vec::new(),
            _ => self.load().await?,
        };
        match change {
            CartChange::Set(line) => match lines.iter_mut().find(|l| l.item_id == line.item_id) {
                Some(existing) => existing.quantity = line.quantity,
                None => lines.push(line),
            },
            CartChange::Remove(item_id) => lines.retain(|line| line.item_id != item_id),
            CartChange::Clear => {}
        }
        self.save(lines).await
    }

    async fn save(&self, lines: Vec<CartLine>) -> Result<(), CommerceError> {
        if lines.is_empty() {
            self.session
                .remove::<Vec<CartLine>>(session_keys::GUEST_CART)
                .await?;
        } else {
            self.session.insert(session_keys::GUEST_CART, lines).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for GuestCart {
    async fn lines<T: CartRepository>(&self, _tx: &mut T) -> Result<Vec<CartLine>, CommerceError> {
        self.load().await
    }

    async fn quantity<T: CartRepository>(
        &self,
        _tx: &mut T,
        item_id: ItemId,
    ) -> Result<i32, CommerceError> {
        Ok(self
            .load()
            .await?
            .iter()
            .find(|line| line.item_id == item_id)
            .map_or(0, |line| line.quantity))
    }

    async fn upsert<T: CartRepository>(
        &self,
        _tx: &mut T,
        line: CartLine,
    ) -> Result<(), CommerceError> {
        self.apply(CartChange::Set(line)).await
    }

    async fn remove<T: CartRepository>(
        &self,
        _tx: &mut T,
        item_id: ItemId,
    ) -> Result<(), CommerceError> {
        self.apply(CartChange::Remove(item_id)).await
    }

    async fn clear<T: CartRepository>(&self, _tx: &mut T) -> Result<(), CommerceError> {
        self.apply(CartChange::Clear).await
    }

    /// Ends the transaction before touching the session, so a failed commit
    /// leaves the cart as it was.
    async fn settle<Tx: Transaction>(
        &self,
        tx: Tx,
        change: CartChange,
    ) -> Result<(), CommerceError> {
        tx.commit().await?;
        self.apply(change).await
    }
}

/// Persisted cart of a signed-in account.
#[derive(Debug, Clone, Copy)]
pub struct AccountCart {
    account_id: AccountId,
}

impl AccountCart {
    #[must_use]
    pub const fn new(account_id: AccountId) -> Self {
        Self { account_id }
    }

    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }
}

#[async_trait]
impl CartStore for AccountCart {
    async fn lines<T: CartRepository>(&self, tx: &mut T) -> Result<Vec<CartLine>, CommerceError> {
        Ok(tx.cart_lines(self.account_id).await?)
    }

    async fn quantity<T: CartRepository>(
        &self,
        tx: &mut T,
        item_id: ItemId,
    ) -> Result<i32, CommerceError> {
        Ok(tx.cart_quantity(self.account_id, item_id).await?)
    }

    async fn upsert<T: CartRepository>(
        &self,
        tx: &mut T,
        line: CartLine,
    ) -> Result<(), CommerceError> {
        Ok(tx.upsert_cart_line(self.account_id, line).await?)
    }

    async fn remove<T: CartRepository>(
        &self,
        tx: &mut T,
        item_id: ItemId,
    ) -> Result<(), CommerceError> {
        Ok(tx.remove_cart_line(self.account_id, item_id).await?)
    }

    async fn clear<T: CartRepository>(&self, tx: &mut T) -> Result<(), CommerceError> {
        Ok(tx.clear_cart(self.account_id).await?)
    }
}

/// The cart of the current request, chosen once from the session's identity.
#[derive(Debug, Clone)]
pub enum Cart {
    Guest(GuestCart),
    Account(AccountCart),
}

impl Cart {
    /// Pick the account cart when signed in, the session cart otherwise.
    #[must_use]
    pub fn for_request(account_id: Option<AccountId>, session: Session) -> Self {
        match account_id {
            Some(id) => Self::Account(AccountCart::new(id)),
            None => Self::Guest(GuestCart::new(session)),
        }
    }

    /// Account owning the cart, `None` for guests.
    #[must_use]
    pub const fn account_id(&self) -> Option<AccountId> {
        match self {
            Self::Guest(_) => None,
            Self::Account(cart) => Some(cart.account_id()),
        }
    }
}

#[async_trait]
impl CartStore for Cart {
    async fn lines<T: CartRepository>(&self, tx: &mut T) -> Result<Vec<CartLine>, CommerceError> {
        match self {
            Self::Guest(cart) => cart.lines(tx).await,
            Self::Account(cart) => cart.lines(tx).await,
        }
    }

    async fn quantity<T: CartRepository>(
        &self,
        tx: &mut T,
        item_id: ItemId,
    ) -> Result<i32, CommerceError> {
        match self {
            Self::Guest(cart) => cart.quantity(tx, item_id).await,
            Self::Account(cart) => cart.quantity(tx, item_id).await,
        }
    }

    async fn upsert<T: CartRepository>(
        &self,
        tx: &mut T,
        line: CartLine,
    ) -> Result<(), CommerceError> {
        match self {
            Self::Guest(cart) => cart.upsert(tx, line).await,
            Self::Account(cart) => cart.upsert(tx, line).await,
        }
    }

    async fn remove<T: CartRepository>(
        &self,
        tx: &mut T,
        item_id: ItemId,
    ) -> Result<(), CommerceError> {
        match self {
            Self::Guest(cart) => cart.remove(tx, item_id).await,
            Self::Account(cart) => cart.remove(tx, item_id).await,
        }
    }

    async fn clear<T: CartRepository>(&self, tx: &mut T) -> Result<(), CommerceError> {
        match self {
            Self::Guest(cart) => cart.clear(tx).await,
            Self::Account(cart) => cart.clear(tx).await,
        }
    }

    async fn settle<Tx: Transaction>(
        &self,
        tx: Tx,
        change: CartChange,
    ) -> Result<(), CommerceError> {
        match self {
            Self::Guest(cart) => cart.settle(tx, change).await,
            Self::Account(cart) => cart.settle(tx, change).await,
        }
    }
}
