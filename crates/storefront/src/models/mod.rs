//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row types.

pub mod address;
pub mod cart;
pub mod item;
pub mod order;
pub mod review;
pub mod session;

pub use address::{AddressError, DeliveryAddress, PickupStore};
pub use cart::{CartLine, CartLineView};
pub use item::{Item, ItemAvailability, NewItem};
pub use order::{NewOrder, Order, OrderLine, OrderLineView, OrderSummary};
pub use review::{NewReview, Review};
pub use session::{CurrentAccount, keys as session_keys};
