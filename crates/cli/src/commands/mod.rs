//! Subcommand implementations.

pub mod migrate;
pub mod reprice;
pub mod restock;
pub mod seed;
