//! Cart line identity and line items.

use std::fmt;

use royshop_core::{Price, ProductId};
use serde::{Deserialize, Serialize};

/// Identity of a cart line: the same product in the same colour and size.
///
/// Two additions with equal keys always merge into one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
}

impl LineKey {
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        color: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            color: color.into(),
            size: size.into(),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.product_id, self.color, self.size)
    }
}

/// One distinct purchasable configuration in the cart.
///
/// `name`, `unit_price` and `image` are captured when the line is first
/// added and are not refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    #[serde(flatten)]
    pub key: LineKey,
    /// Opaque id for list rendering. Not part of the line's identity.
    pub display_id: String,
    pub name: String,
    pub unit_price: Price,
    /// Always at least 1 while the line is in a cart.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLineItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A request to add a product configuration to the cart.
///
/// ```
/// use royshop_core::Price;
/// use royshop_storefront::cart::{AddItem, LineKey};
///
/// let request = AddItem::new(LineKey::new("p1", "Black", "M"), "Shirt", Price::from_dinars(4500))
///     .with_quantity(2)
///     .with_image("/assets/images/shirt.jpg");
/// assert_eq!(request.quantity, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddItem {
    pub key: LineKey,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
    /// Requested quantity. Values below 1 are treated as 1.
    pub quantity: i64,
}

impl AddItem {
    /// Request a single unit of `key`.
    #[must_use]
    pub fn new(key: LineKey, name: impl Into<String>, unit_price: Price) -> Self {
        Self {
            key,
            name: name.into(),
            unit_price,
            image: None,
            quantity: 1,
        }
    }

    #[must_use]
    pub const fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// The quantity actually applied: clamped to `1..=u32::MAX`.
    #[must_use]
    pub fn effective_quantity(&self) -> u32 {
        u32::try_from(self.quantity.max(1)).unwrap_or(u32::MAX)
    }
}
