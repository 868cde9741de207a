//! Order queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use bookstore_core::{AccountId, ItemId, OrderId, OrderStatus, Price};

use crate::db::RepositoryError;
use crate::models::{NewOrder, Order, OrderLine};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    account_id: i32,
    created_at: DateTime<Utc>,
    status: String,
    address: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            account_id: AccountId::new(row.account_id),
            created_at: row.created_at,
            status,
            address: row.address,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: i32,
    item_id: i32,
    quantity: i32,
    price_snapshot: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        let price_snapshot = Price::new(row.price_snapshot).map_err(|e| {
            RepositoryError::DataCorruption(format!("order {} line: {e}", row.order_id))
        })?;

        Ok(Self {
            order_id: OrderId::new(row.order_id),
            item_id: ItemId::new(row.item_id),
            quantity: row.quantity,
            price_snapshot,
        })
    }
}

pub(super) async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO orders (account_id, created_at, status, address)
        VALUES ($1, $2, $3, $4)
        RETURNING id, account_id, created_at, status, address
        ",
    )
    .bind(order.account_id.as_i32())
    .bind(order.created_at)
    .bind(OrderStatus::Active.as_str())
    .bind(&order.address)
    .fetch_one(&mut *conn)
    .await?;

    Order::try_from(row)
}

pub(super) async fn insert_order_line(
    conn: &mut PgConnection,
    line: &OrderLine,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_items (order_id, item_id, quantity, price_snapshot)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(line.order_id.as_i32())
    .bind(line.item_id.as_i32())
    .bind(line.quantity)
    .bind(line.price_snapshot.amount())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(super) async fn order_for_update(
    conn: &mut PgConnection,
    account: AccountId,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, account_id, created_at, status, address
        FROM orders
        WHERE id = $1 AND account_id = $2
        FOR UPDATE
        ",
    )
    .bind(id.as_i32())
    .bind(account.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Order::try_from).transpose()
}

pub(super) async fn set_order_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id.as_i32())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

pub(super) async fn orders(
    conn: &mut PgConnection,
    account: AccountId,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, account_id, created_at, status, address
        FROM orders
        WHERE account_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC, id DESC
        ",
    )
    .bind(account.as_i32())
    .bind(status.map(|s| s.as_str()))
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Order::try_from).collect()
}

pub(super) async fn order_lines(
    conn: &mut PgConnection,
    ids: &[OrderId],
) -> Result<Vec<OrderLine>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();
    let rows = sqlx::query_as::<_, OrderLineRow>(
        r"
        SELECT order_id, item_id, quantity, price_snapshot
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id, id
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(OrderLine::try_from).collect()
}
