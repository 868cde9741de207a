//! Session-related types.
//!
//! Types stored in the session for authentication state and the guest cart.

use serde::{Deserialize, Serialize};

use bookstore_core::AccountId;

/// Session-stored account identity.
///
/// Written by the authentication collaborator after a successful login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CurrentAccount {
    /// Account's database ID.
    pub id: AccountId,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";

    /// Key for the guest cart lines.
    pub const GUEST_CART: &str = "guest_cart";
}
