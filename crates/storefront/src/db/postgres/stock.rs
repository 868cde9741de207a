//! Stock queries.

use sqlx::PgConnection;

use bookstore_core::ItemId;

use crate::db::RepositoryError;

pub(super) async fn stock(conn: &mut PgConnection, id: ItemId) -> Result<Option<i32>, RepositoryError> {
    let quantity = sqlx::query_scalar::<_, i32>("SELECT quantity FROM stock WHERE item_id = $1")
        .bind(id.as_i32())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(quantity)
}

/// The `quantity >= $1` guard makes concurrent checkouts race on the row
/// lock instead of overselling: the loser sees zero affected rows.
pub(super) async fn decrement_stock(
    conn: &mut PgConnection,
    id: ItemId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE stock SET quantity = quantity - $1 WHERE item_id = $2 AND quantity >= $1",
    )
    .bind(quantity)
    .bind(id.as_i32())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(super) async fn set_stock(
    conn: &mut PgConnection,
    id: ItemId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO stock (item_id, quantity)
        VALUES ($1, $2)
        ON CONFLICT (item_id) DO UPDATE SET quantity = EXCLUDED.quantity
        ",
    )
    .bind(id.as_i32())
    .bind(quantity)
    .execute(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            RepositoryError::NotFound
        }
        sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
            RepositoryError::Conflict(format!("stock of item {id} cannot be negative"))
        }
        _ => RepositoryError::Database(e),
    })?;
    Ok(())
}
