//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. `TraceLayer` (request tracing)
//! 2. Session layer (tower-sessions with `PostgreSQL` store)

pub mod auth;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_account, set_current_account};
pub use session::{SESSION_COOKIE_NAME, configure_session_layer, create_session_layer};
