//! Catalog queries.

use rust_decimal::Decimal;
use sqlx::PgConnection;

use bookstore_core::{ItemId, Price, RatingSummary};

use crate::db::RepositoryError;
use crate::models::{Item, NewItem};

const ITEM_COLUMNS: &str = "i.id, i.title, i.author, i.year, i.price, i.cover, i.description, \
                            i.rating, i.rating_count";

/// Internal row type for item queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i32,
    title: String,
    author: String,
    year: Option<i32>,
    price: Decimal,
    cover: Option<String>,
    description: Option<String>,
    rating: Option<f64>,
    rating_count: i32,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ItemId::new(row.id),
            title: row.title,
            author: row.author,
            year: row.year,
            price,
            cover: row.cover,
            description: row.description,
            rating: RatingSummary {
                average: row.rating,
                count: row.rating_count,
            },
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> Result<Vec<Item>, RepositoryError> {
    rows.into_iter().map(Item::try_from).collect()
}

pub(super) async fn item(conn: &mut PgConnection, id: ItemId) -> Result<Option<Item>, RepositoryError> {
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = $1"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Item::try_from).transpose()
}

pub(super) async fn item_for_update(
    conn: &mut PgConnection,
    id: ItemId,
) -> Result<Option<Item>, RepositoryError> {
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = $1 FOR UPDATE"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Item::try_from).transpose()
}

pub(super) async fn items(
    conn: &mut PgConnection,
    ids: &[ItemId],
) -> Result<Vec<Item>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(ItemId::as_i32).collect();
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    into_items(rows)
}

pub(super) async fn insert_item(
    conn: &mut PgConnection,
    item: &NewItem,
) -> Result<Item, RepositoryError> {
    let row = sqlx::query_as::<_, ItemRow>(
        r"
        INSERT INTO items (title, author, year, price, cover, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, author, year, price, cover, description, rating, rating_count
        ",
    )
    .bind(&item.title)
    .bind(&item.author)
    .bind(item.year)
    .bind(item.price.amount())
    .bind(&item.cover)
    .bind(&item.description)
    .fetch_one(&mut *conn)
    .await?;

    Item::try_from(row)
}

pub(super) async fn set_rating(
    conn: &mut PgConnection,
    id: ItemId,
    rating: RatingSummary,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE items SET rating = $1, rating_count = $2 WHERE id = $3")
        .bind(rating.average)
        .bind(rating.count)
        .bind(id.as_i32())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

pub(super) async fn set_price(
    conn: &mut PgConnection,
    id: ItemId,
    price: Price,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE items SET price = $1 WHERE id = $2")
        .bind(price.amount())
        .bind(id.as_i32())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

pub(super) async fn top_items(
    conn: &mut PgConnection,
    limit: usize,
) -> Result<Vec<Item>, RepositoryError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        r"
        SELECT {ITEM_COLUMNS}
        FROM items i
        JOIN stock s ON s.item_id = i.id AND s.quantity > 0
        LEFT JOIN (
            SELECT item_id, SUM(quantity) AS sold
            FROM order_items
            GROUP BY item_id
        ) sales ON sales.item_id = i.id
        ORDER BY COALESCE(sales.sold, 0) DESC, i.rating DESC NULLS LAST, i.id
        LIMIT $1
        "
    ))
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    into_items(rows)
}

pub(super) async fn search_items(
    conn: &mut PgConnection,
    query: &str,
    limit: usize,
) -> Result<Vec<Item>, RepositoryError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        r"
        SELECT {ITEM_COLUMNS}
        FROM items i
        WHERE i.title ILIKE $1 OR i.author ILIKE $1
        ORDER BY i.title, i.id
        LIMIT $2
        "
    ))
    .bind(contains_pattern(query))
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    into_items(rows)
}

/// `LIKE` pattern matching `query` anywhere, with its wildcards escaped.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("dune"), "%dune%");
        assert_eq!(contains_pattern("100%_"), r"%100\%\_%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
