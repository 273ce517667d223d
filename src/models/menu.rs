//! Menu and cart structures.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// A dish or drink offered by the restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Opaque identity of the item
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description shown on the card
    #[serde(default)]
    pub description: String,
    /// Unit price in rupees, never negative
    pub price: f64,
    /// Picture shown on the card
    #[serde(default)]
    pub image_url: String,
    /// Menu section (e.g. `"Main Courses"`)
    #[serde(default)]
    pub category: String,
}

impl MenuItem {
    /// Checks the structural invariants an admin edit must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidMenuItem {
                message: "id cannot be empty".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidMenuItem {
                message: "name cannot be empty".to_string(),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidMenuItem {
                message: format!("price must be zero or more, got {}", self.price),
            });
        }
        Ok(())
    }
}

/// A menu item with a quantity, living only inside the active cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// The item as it was priced when added
    #[serde(flatten)]
    pub item: MenuItem,
    /// Number of portions, always at least one
    pub quantity: u32,
}

impl CartItem {
    /// Creates a single-portion line for `item`.
    #[must_use]
    pub fn single(item: MenuItem) -> Self {
        Self { item, quantity: 1 }
    }

    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.item.price * f64::from(self.quantity)
    }
}

/// Sum of all line totals in a cart.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}

/// Returns the cart with one more portion of `item`, appending a new line if needed.
#[must_use]
pub fn with_added_item(cart: &[CartItem], item: &MenuItem) -> Vec<CartItem> {
    let mut next = cart.to_vec();
    match next.iter_mut().find(|line| line.item.id == item.id) {
        Some(line) => line.quantity += 1,
        None => next.push(CartItem::single(item.clone())),
    }
    next
}

/// Returns the cart with `change` applied to the line for `item_id`.
///
/// Lines that end up at zero or below are removed.
#[must_use]
pub fn with_quantity_change(cart: &[CartItem], item_id: &str, change: i64) -> Vec<CartItem> {
    cart.iter()
        .filter_map(|line| {
            if line.item.id != item_id {
                return Some(line.clone());
            }
            let quantity = i64::from(line.quantity) + change;
            u32::try_from(quantity)
                .ok()
                .filter(|q| *q > 0)
                .map(|quantity| CartItem {
                    item: line.item.clone(),
                    quantity,
                })
        })
        .collect()
}
