//! In-memory storage backend.
//!
//! Intended for tests and local runs. A transaction takes the table lock for
//! its whole lifetime and works on a private copy of the tables, so
//! transactions are serialized and a dropped transaction leaves no trace.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bookstore_core::{AccountId, ItemId, OrderId, OrderStatus, Price, RatingSummary, ReviewId};

use super::{
    CartRepository, CatalogRepository, Database, OrderRepository, RepositoryError,
    ReviewRepository, StockRepository, Transaction,
};
use crate::models::{CartLine, Item, NewItem, NewOrder, NewReview, Order, OrderLine, Review};

#[derive(Debug, Clone, Default)]
struct Tables {
    items: HashMap<ItemId, Item>,
    stock: HashMap<ItemId, i32>,
    carts: HashMap<AccountId, Vec<CartLine>>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    reviews: Vec<Review>,
    last_item_id: i32,
    last_order_id: i32,
    last_review_id: i32,
}

/// Storage backend keeping every table in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    #[cfg(test)]
    failing_commits: Arc<std::sync::atomic::AtomicBool>,
}

impl MemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later commit fail without applying anything.
    #[cfg(test)]
    pub(crate) fn fail_commits(&self) {
        self.failing_commits
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTransaction {
            guard,
            working,
            #[cfg(test)]
            failing: self
                .failing_commits
                .load(std::sync::atomic::Ordering::SeqCst),
        })
    }
}

/// A transaction over a [`MemoryDatabase`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    #[cfg(test)]
    failing: bool,
}

impl MemoryTransaction {
    #[cfg(test)]
    fn check_commit(&self) -> Result<(), RepositoryError> {
        if self.failing {
            return Err(RepositoryError::Conflict("commit refused".to_owned()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    const fn check_commit(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self) -> Result<(), RepositoryError> {
        self.check_commit()?;
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryTransaction {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.working.items.get(&id).cloned())
    }

    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        // The table lock is already exclusive.
        self.item(id).await
    }

    async fn items(&mut self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.items.get(id).cloned())
            .collect())
    }

    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, RepositoryError> {
        self.working.last_item_id += 1;
        let item = Item {
            id: ItemId::new(self.working.last_item_id),
            title: item.title.clone(),
            author: item.author.clone(),
            year: item.year,
            price: item.price,
            cover: item.cover.clone(),
            description: item.description.clone(),
            rating: RatingSummary::unrated(),
        };
        self.working.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn set_rating(
        &mut self,
        id: ItemId,
        rating: RatingSummary,
    ) -> Result<(), RepositoryError> {
        let item = self
            .working
            .items
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        item.rating = rating;
        Ok(())
    }

    async fn set_price(&mut self, id: ItemId, price: Price) -> Result<(), RepositoryError> {
        let item = self
            .working
            .items
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        item.price = price;
        Ok(())
    }

    async fn top_items(&mut self, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        let mut sold: HashMap<ItemId, i64> = HashMap::new();
        for line in &self.working.order_lines {
            *sold.entry(line.item_id).or_default() += i64::from(line.quantity);
        }

        let mut ranked: Vec<(i64, Item)> = self
            .working
            .items
            .values()
            .filter(|item| self.working.stock.get(&item.id).copied().unwrap_or(0) > 0)
            .map(|item| (sold.get(&item.id).copied().unwrap_or(0), item.clone()))
            .collect();

        ranked.sort_by(|(a_sold, a), (b_sold, b)| {
            b_sold
                .cmp(a_sold)
                .then_with(|| compare_ratings_desc(a, b))
                .then_with(|| a.id.as_i32().cmp(&b.id.as_i32()))
        });

        Ok(ranked.into_iter().take(limit).map(|(_, item)| item).collect())
    }

    async fn search_items(
        &mut self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        let needle = query.to_lowercase();
        let mut found: Vec<Item> = self
            .working
            .items
            .values()
            .filter(|item| {
                item.title.to_lowercase().contains(&needle)
                    || item.author.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.title
                .cmp(&b.title)
                .then_with(|| a.id.as_i32().cmp(&b.id.as_i32()))
        });
        found.truncate(limit);
        Ok(found)
    }
}

/// Higher rating first, unrated items last.
fn compare_ratings_desc(a: &Item, b: &Item) -> Ordering {
    let a = a.rating.average.unwrap_or(f64::NEG_INFINITY);
    let b = b.rating.average.unwrap_or(f64::NEG_INFINITY);
    b.total_cmp(&a)
}

#[async_trait]
impl StockRepository for MemoryTransaction {
    async fn stock(&mut self, id: ItemId) -> Result<Option<i32>, RepositoryError> {
        Ok(self.working.stock.get(&id).copied())
    }

    async fn decrement_stock(
        &mut self,
        id: ItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        match self.working.stock.get_mut(&id) {
            Some(available) if *available >= quantity => {
                *available -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_stock(&mut self, id: ItemId, quantity: i32) -> Result<(), RepositoryError> {
        if quantity < 0 {
            return Err(RepositoryError::Conflict(format!(
                "stock of item {id} cannot be negative"
            )));
        }
        if !self.working.items.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        self.working.stock.insert(id, quantity);
        Ok(())
    }
}

#[async_trait]
impl CartRepository for MemoryTransaction {
    async fn cart_lines(&mut self, account: AccountId) -> Result<Vec<CartLine>, RepositoryError> {
        Ok(self
            .working
            .carts
            .get(&account)
            .cloned()
            .unwrap_or_default())
    }

    async fn cart_quantity(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<i32, RepositoryError> {
        Ok(self
            .working
            .carts
            .get(&account)
            .and_then(|lines| lines.iter().find(|line| line.item_id == item))
            .map_or(0, |line| line.quantity))
    }

    async fn upsert_cart_line(
        &mut self,
        account: AccountId,
        line: CartLine,
    ) -> Result<(), RepositoryError> {
        let lines = self.working.carts.entry(account).or_default();
        match lines.iter_mut().find(|l| l.item_id == line.item_id) {
            Some(existing) => existing.quantity = line.quantity,
            None => lines.push(line),
        }
        Ok(())
    }

    async fn remove_cart_line(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<(), RepositoryError> {
        if let Some(lines) = self.working.carts.get_mut(&account) {
            lines.retain(|line| line.item_id != item);
        }
        Ok(())
    }

    async fn clear_cart(&mut self, account: AccountId) -> Result<(), RepositoryError> {
        self.working.carts.remove(&account);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        self.working.last_order_id += 1;
        let order = Order {
            id: OrderId::new(self.working.last_order_id),
            account_id: order.account_id,
            created_at: order.created_at,
            status: OrderStatus::Active,
            address: order.address.clone(),
        };
        self.working.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_order_line(&mut self, line: &OrderLine) -> Result<(), RepositoryError> {
        if !self.working.orders.iter().any(|o| o.id == line.order_id) {
            return Err(RepositoryError::NotFound);
        }
        self.working.order_lines.push(*line);
        Ok(())
    }

    async fn order_for_update(
        &mut self,
        account: AccountId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .working
            .orders
            .iter()
            .find(|o| o.id == id && o.account_id == account)
            .cloned())
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let order = self
            .working
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        Ok(())
    }

    async fn orders(
        &mut self,
        account: AccountId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .working
            .orders
            .iter()
            .filter(|o| o.account_id == account)
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(orders)
    }

    async fn order_lines(&mut self, ids: &[OrderId]) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self
            .working
            .order_lines
            .iter()
            .filter(|line| ids.contains(&line.order_id))
            .copied()
            .collect())
    }
}

#[async_trait]
impl ReviewRepository for MemoryTransaction {
    async fn review_exists(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .working
            .reviews
            .iter()
            .any(|r| r.account_id == account && r.item_id == item))
    }

    async fn insert_review(&mut self, review: &NewReview) -> Result<Review, RepositoryError> {
        if self.review_exists(review.account_id, review.item_id).await? {
            return Err(RepositoryError::Conflict(format!(
                "account {} already reviewed item {}",
                review.account_id, review.item_id
            )));
        }
        self.working.last_review_id += 1;
        let review = Review {
            id: ReviewId::new(self.working.last_review_id),
            account_id: review.account_id,
            item_id: review.item_id,
            score: review.score,
            body: review.body.clone(),
            created_at: Utc::now(),
        };
        self.working.reviews.push(review.clone());
        Ok(review)
    }

    async fn reviews(&mut self, item: ItemId) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = self
            .working
            .reviews
            .iter()
            .filter(|r| r.item_id == item)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(reviews)
    }
}
