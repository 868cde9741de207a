//! Change the price of an item.

use secrecy::SecretString;

use bookstore_core::{ItemId, Price};
use bookstore_storefront::db::{self, PgDatabase};
use bookstore_storefront::services::CatalogService;

/// Set the unit price of `item_id`.
///
/// # Errors
///
/// Returns an error if the item does not exist or the database is
/// unreachable.
pub async fn run(
    database_url: &SecretString,
    item_id: ItemId,
    price: Price,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(database_url, 1).await?;
    let database = PgDatabase::new(pool);
    CatalogService::new(&database)
        .set_price(item_id, price)
        .await?;

    tracing::info!(item_id = %item_id, price = %price, "Price updated");
    Ok(())
}
