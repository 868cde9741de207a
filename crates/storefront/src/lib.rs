//! Bookstore storefront library.
//!
//! Cart, stock, order and review services over a pluggable storage backend,
//! plus the JSON routes that expose them. Split out of the binary so it can
//! be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
