//! Set the stock of an item.

use secrecy::SecretString;

use bookstore_core::ItemId;
use bookstore_storefront::db::{self, PgDatabase};
use bookstore_storefront::services::CatalogService;

/// Replace the stock quantity of `item_id`.
///
/// # Errors
///
/// Returns an error if the item does not exist, the quantity is negative,
/// or the database is unreachable.
pub async fn run(
    database_url: &SecretString,
    item_id: ItemId,
    quantity: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    if quantity < 0 {
        return Err("quantity must not be negative".into());
    }

    let pool = db::create_pool(database_url, 1).await?;
    let database = PgDatabase::new(pool);
    CatalogService::new(&database)
        .restock(item_id, quantity)
        .await?;

    tracing::info!(item_id = %item_id, quantity, "Stock updated");
    Ok(())
}
