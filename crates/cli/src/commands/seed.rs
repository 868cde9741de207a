//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! - title: The Master and Margarita
//!   author: Mikhail Bulgakov
//!   year: 1967
//!   price: "12.50"
//!   stock: 4
//! ```

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, info};

use bookstore_storefront::db::{self, PgDatabase};
use bookstore_storefront::models::NewItem;
use bookstore_storefront::services::CatalogService;

/// One catalog entry: the item and its initial stock.
#[derive(Debug, Deserialize)]
pub struct SeedItem {
    #[serde(flatten)]
    pub item: NewItem,
    #[serde(default)]
    pub stock: i32,
}

/// Check entries before anything is written. Returns one message per problem.
#[must_use]
pub fn validate(entries: &[SeedItem]) -> Vec<String> {
    let mut errors = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        if entry.item.title.trim().is_empty() {
            errors.push(format!("entry {i}: title is empty"));
        }
        if entry.item.author.trim().is_empty() {
            errors.push(format!("entry {i}: author is empty"));
        }
        if entry.stock < 0 {
            errors.push(format!("entry {i} ({}): stock is negative", entry.item.title));
        }
    }
    errors
}

/// Insert every entry of `file_path` into the catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or an insert fails.
pub async fn catalog(
    database_url: &SecretString,
    file_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path).await?;
    let entries: Vec<SeedItem> = serde_yaml::from_str(&content)?;

    let errors = validate(&entries);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(database_url, 2).await?;
    let database = PgDatabase::new(pool);
    let catalog = CatalogService::new(&database);

    for entry in &entries {
        catalog.add_item(&entry.item, entry.stock).await?;
    }

    info!(items = entries.len(), "Seeding complete!");
    Ok(())
}
