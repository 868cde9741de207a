//! Review queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use bookstore_core::{AccountId, ItemId, ReviewId, Score};

use crate::db::RepositoryError;
use crate::models::{NewReview, Review};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    account_id: i32,
    item_id: i32,
    score: i16,
    body: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let score = Score::new(i64::from(row.score)).map_err(|e| {
            RepositoryError::DataCorruption(format!("review {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ReviewId::new(row.id),
            account_id: AccountId::new(row.account_id),
            item_id: ItemId::new(row.item_id),
            score,
            body: row.body,
            created_at: row.created_at,
        })
    }
}

pub(super) async fn review_exists(
    conn: &mut PgConnection,
    account: AccountId,
    item: ItemId,
) -> Result<bool, RepositoryError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM reviews WHERE account_id = $1 AND item_id = $2)",
    )
    .bind(account.as_i32())
    .bind(item.as_i32())
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

pub(super) async fn insert_review(
    conn: &mut PgConnection,
    review: &NewReview,
) -> Result<Review, RepositoryError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        r"
        INSERT INTO reviews (account_id, item_id, score, body)
        VALUES ($1, $2, $3, $4)
        RETURNING id, account_id, item_id, score, body, created_at
        ",
    )
    .bind(review.account_id.as_i32())
    .bind(review.item_id.as_i32())
    .bind(i16::from(review.score.get()))
    .bind(&review.body)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(format!(
                "account {} already reviewed item {}",
                review.account_id, review.item_id
            ))
        }
        _ => RepositoryError::Database(e),
    })?;

    Review::try_from(row)
}

pub(super) async fn reviews(
    conn: &mut PgConnection,
    item: ItemId,
) -> Result<Vec<Review>, RepositoryError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        r"
        SELECT id, account_id, item_id, score, body, created_at
        FROM reviews
        WHERE item_id = $1
        ORDER BY created_at DESC, id DESC
        ",
    )
    .bind(item.as_i32())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Review::try_from).collect()
}
