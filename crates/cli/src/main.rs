//! Bookstore CLI - database migrations and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (including the session table)
//! bookstore-cli migrate
//!
//! # Load items and their stock from a YAML file
//! bookstore-cli seed catalog.yaml
//!
//! # Set the stock of an item
//! bookstore-cli restock 42 10
//!
//! # Change the price of an item (placed orders keep theirs)
//! bookstore-cli reprice 42 12.99
//! ```
//!
//! The database URL is read from `STOREFRONT_DATABASE_URL` (or
//! `--database-url`), after loading `.env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use bookstore_core::{ItemId, Price};

mod commands;

#[derive(Parser)]
#[command(name = "bookstore-cli")]
#[command(author, version, about = "Bookstore CLI tools")]
struct Cli {
    /// `PostgreSQL` connection string
    #[arg(long, env = "STOREFRONT_DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Add catalog items with their initial stock from a YAML file
    Seed {
        /// Path to the catalog file
        file: PathBuf,
    },
    /// Set the stock of an existing item
    Restock {
        /// Item ID
        item_id: i32,
        /// New stock quantity
        quantity: i32,
    },
    /// Change the unit price of an existing item
    Reprice {
        /// Item ID
        item_id: i32,
        /// New unit price, e.g. 12.99
        price: Price,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = SecretString::from(cli.database_url);

    match cli.command {
        Commands::Migrate => commands::migrate::run(&database_url).await?,
        Commands::Seed { file } => commands::seed::catalog(&database_url, &file).await?,
        Commands::Restock { item_id, quantity } => {
            commands::restock::run(&database_url, ItemId::new(item_id), quantity).await?;
        }
        Commands::Reprice { item_id, price } => {
            commands::reprice::run(&database_url, ItemId::new(item_id), price).await?;
        }
    }
    Ok(())
}
