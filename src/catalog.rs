//! Equipment catalog
//!
//! Items that can be purchased outright or rented by the hour. Prices are
//! opaque cost inputs to billing; the dispatch core never looks at them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("item name must not be empty")]
    EmptyName,

    #[error("duplicate catalog item: {0}")]
    DuplicateItem(String),

    #[error("{name}: prices must be non-negative (purchase={purchase}, rent={rent}/h)")]
    NegativePrice {
        name: String,
        purchase: Decimal,
        rent: Decimal,
    },
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub purchase_price: Decimal,
    pub rental_price_per_hour: Decimal,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        purchase_price: Decimal,
        rental_price_per_hour: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            purchase_price,
            rental_price_per_hour,
        }
    }
}

/// Ordered list of items with exact-name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    /// Build a catalog, rejecting blank names, duplicates and negative prices
    pub fn new(items: Vec<Item>) -> Result<Self, CatalogError> {
        for (idx, item) in items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if item.purchase_price < Decimal::ZERO || item.rental_price_per_hour < Decimal::ZERO {
                return Err(CatalogError::NegativePrice {
                    name: item.name.clone(),
                    purchase: item.purchase_price,
                    rent: item.rental_price_per_hour,
                });
            }
            if items[..idx].iter().any(|other| other.name == item.name) {
                return Err(CatalogError::DuplicateItem(item.name.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Look up an item by its exact name
    pub fn item_by_name(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One line per item: `name - Rs.<purchase> (Purchase) / Rs.<rent> per hour (Rent)`
    pub fn render_menu(&self) -> String {
        let mut out = String::from("Menu:\n");
        for item in &self.items {
            out.push_str(&format!(
                "{} - Rs.{} (Purchase) / Rs.{} per hour (Rent)\n",
                item.name, item.purchase_price, item.rental_price_per_hour
            ));
        }
        out
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            items: vec![
                Item::new("Oxygen Cylinder (10 ltr)", dec!(4500), dec!(200)),
                Item::new("Medical Ventilator", dec!(120000), dec!(829)),
                Item::new("Blood pressure monitoring device", dec!(849), dec!(40)),
                Item::new("ECG machine", dec!(17700), dec!(500)),
                Item::new("Patient Monitor", dec!(12999), dec!(450)),
                Item::new("BPL Oximeter", dec!(1269), dec!(300)),
                Item::new("Nebulizer", dec!(9599), dec!(200)),
            ],
        }
    }
}
