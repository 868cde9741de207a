//! Core types for the bookstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod rating;
pub mod status;

pub use id::*;
pub use price::{Price, PriceError};
pub use rating::{RatingSummary, Score, ScoreError};
pub use status::{OrderStatus, OrderStatusError};
