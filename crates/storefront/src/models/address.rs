//! Delivery address forms and their resolution into an order address.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from resolving a delivery address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The selected store is not one of the configured pickup stores.
    #[error("unknown pickup store: {0}")]
    UnknownPickupStore(String),
    /// A required courier field is blank.
    #[error("missing address field: {0}")]
    MissingField(&'static str),
    /// A pickup store entry is not `name|street|city`.
    #[error("pickup store must be `name|street|city`, got `{0}`")]
    MalformedPickupStore(String),
}

/// A store where orders can be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickupStore {
    pub name: String,
    pub street: String,
    pub city: String,
}

impl PickupStore {
    /// The stores offered when none are configured.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        [
            ("Downtown Books", "Main Street 12", "Springfield"),
            ("Readers Corner", "Oak Avenue 7", "Riverdale"),
            ("Book Haven", "Maple Road 45", "Hill Valley"),
            ("City Library Pickup", "Broadway 101", "Fairview"),
        ]
        .into_iter()
        .map(|(name, street, city)| Self {
            name: name.to_owned(),
            street: street.to_owned(),
            city: city.to_owned(),
        })
        .collect()
    }
}

impl fmt::Display for PickupStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.name, self.street, self.city)
    }
}

impl FromStr for PickupStore {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').map(str::trim).collect();
        match parts.as_slice() {
            [name, street, city] if !name.is_empty() && !street.is_empty() && !city.is_empty() => {
                Ok(Self {
                    name: (*name).to_owned(),
                    street: (*street).to_owned(),
                    city: (*city).to_owned(),
                })
            }
            _ => Err(AddressError::MalformedPickupStore(s.to_owned())),
        }
    }
}

/// Delivery details submitted at checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DeliveryAddress {
    /// Collect the order at one of the pickup stores, selected by name.
    StorePickup { store: String },
    /// Courier delivery to a street address.
    Courier {
        street: String,
        house: String,
        #[serde(default)]
        apartment: Option<String>,
        city: String,
        postal_code: String,
    },
}

impl DeliveryAddress {
    /// Resolve into the free-text address stored on the order.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::UnknownPickupStore`] for a store that is not in
    /// `stores`, or [`AddressError::MissingField`] when a required courier
    /// field is blank.
    pub fn resolve(&self, stores: &[PickupStore]) -> Result<String, AddressError> {
        match self {
            Self::StorePickup { store } => stores
                .iter()
                .find(|s| s.name == store.trim())
                .map(ToString::to_string)
                .ok_or_else(|| AddressError::UnknownPickupStore(store.clone())),
            Self::Courier {
                street,
                house,
                apartment,
                city,
                postal_code,
            } => {
                let street = required("street", street)?;
                let house = required("house", house)?;
                let city = required("city", city)?;
                let postal_code = required("postal_code", postal_code)?;
                let apartment = apartment.as_deref().map_or("", str::trim);
                Ok(format!(
                    "{street}, {house}, {apartment}, {city}, {postal_code}"
                ))
            }
        }
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AddressError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AddressError::MissingField(field));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn courier(street: &str, apartment: Option<&str>) -> DeliveryAddress {
        DeliveryAddress::Courier {
            street: street.to_owned(),
            house: "4".to_owned(),
            apartment: apartment.map(str::to_owned),
            city: "Shelbyville".to_owned(),
            postal_code: "12345".to_owned(),
        }
    }

    #[test]
    fn test_store_pickup_resolves_configured_store() {
        let address = DeliveryAddress::StorePickup {
            store: "Book Haven".to_owned(),
        };
        assert_eq!(
            address.resolve(&PickupStore::defaults()).unwrap(),
            "Book Haven, Maple Road 45, Hill Valley"
        );
    }

    #[test]
    fn test_store_pickup_rejects_unknown_store() {
        let address = DeliveryAddress::StorePickup {
            store: "Nowhere".to_owned(),
        };
        assert_eq!(
            address.resolve(&PickupStore::defaults()),
            Err(AddressError::UnknownPickupStore("Nowhere".to_owned()))
        );
    }

    #[test]
    fn test_courier_address_format() {
        assert_eq!(
            courier("Elm Street", Some("12")).resolve(&[]).unwrap(),
            "Elm Street, 4, 12, Shelbyville, 12345"
        );
        assert_eq!(
            courier("Elm Street", None).resolve(&[]).unwrap(),
            "Elm Street, 4, , Shelbyville, 12345"
        );
    }

    #[test]
    fn test_courier_requires_street() {
        assert_eq!(
            courier("   ", None).resolve(&[]),
            Err(AddressError::MissingField("street"))
        );
    }

    #[test]
    fn test_deserialize_tagged() {
        let address: DeliveryAddress =
            serde_json::from_str(r#"{"method":"store_pickup","store":"Readers Corner"}"#).unwrap();
        assert!(matches!(address, DeliveryAddress::StorePickup { .. }));
    }

    #[test]
    fn test_pickup_store_from_str() {
        let store: PickupStore = "A | B | C".parse().unwrap();
        assert_eq!(store.to_string(), "A, B, C");
        assert!("A|B".parse::<PickupStore>().is_err());
    }
}
