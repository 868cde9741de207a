//! Order status state machine.
//!
//! An order is created `active` and becomes `complete` once the customer
//! marks it received. `complete` is terminal.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown order status.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {0}")]
pub struct OrderStatusError(pub String);

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed and awaiting delivery or pickup.
    #[default]
    Active,
    /// Received by the customer.
    Complete,
}

impl OrderStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!((self, next), (Self::Active, Self::Complete))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "complete" => Ok(Self::Complete),
            _ => Err(OrderStatusError(s.to_owned())),
        }
    }
}
