//! Bookstore Core - Shared domain types.
//!
//! This crate provides the types shared by the bookstore components:
//! - `storefront` - Cart, checkout, order history and reviews
//! - `cli` - Command-line tools for migrations, seeding and restocking
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no
//! database access, no HTTP. Database encodings are available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, order statuses and ratings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
