//! Account cart queries.

use sqlx::PgConnection;

use bookstore_core::{AccountId, ItemId};

use crate::db::RepositoryError;
use crate::models::CartLine;

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    item_id: i32,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            item_id: ItemId::new(row.item_id),
            quantity: row.quantity,
        }
    }
}

pub(super) async fn cart_lines(
    conn: &mut PgConnection,
    account: AccountId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        "SELECT item_id, quantity FROM cart_items WHERE account_id = $1 ORDER BY added_at, item_id",
    )
    .bind(account.as_i32())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

pub(super) async fn cart_quantity(
    conn: &mut PgConnection,
    account: AccountId,
    item: ItemId,
) -> Result<i32, RepositoryError> {
    let quantity = sqlx::query_scalar::<_, i32>(
        "SELECT quantity FROM cart_items WHERE account_id = $1 AND item_id = $2",
    )
    .bind(account.as_i32())
    .bind(item.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(quantity.unwrap_or(0))
}

pub(super) async fn upsert_cart_line(
    conn: &mut PgConnection,
    account: AccountId,
    line: CartLine,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO cart_items (account_id, item_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (account_id, item_id) DO UPDATE SET quantity = EXCLUDED.quantity
        ",
    )
    .bind(account.as_i32())
    .bind(line.item_id.as_i32())
    .bind(line.quantity)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(super) async fn remove_cart_line(
    conn: &mut PgConnection,
    account: AccountId,
    item: ItemId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE account_id = $1 AND item_id = $2")
        .bind(account.as_i32())
        .bind(item.as_i32())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(super) async fn clear_cart(
    conn: &mut PgConnection,
    account: AccountId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE account_id = $1")
        .bind(account.as_i32())
        .execute(&mut *conn)
        .await?;
    Ok(())
}
