//! Row types for the hosted tables.
//!
//! Field names follow the table columns (`snake_case`). Columns that are
//! nullable or were added later are read leniently: `null` and missing
//! values fall back to defaults instead of failing the whole response.

use chrono::{DateTime, NaiveDate, Utc};
use royshop_core::{OrderId, OrderStatus, PaymentStatus, PhoneNumber, Price, ProductId, Rating, ReviewId};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::cart::CartLineItem;

// =============================================================================
// Deserialization Helpers
// =============================================================================

/// Treat `null` like a missing column.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept both text and integer primary keys.
fn string_or_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => T::from(s),
        Raw::Int(n) => T::from(n.to_string()),
    })
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product (`products` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "string_or_number")]
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, deserialize_with = "nullable")]
    pub stock: i64,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    /// Care instructions.
    #[serde(default)]
    pub care: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Average review rating, `0` when unrated.
    #[serde(default, rename = "rating", alias = "average_rating", deserialize_with = "nullable")]
    pub rating_average: f64,
    #[serde(default, rename = "reviewCount", deserialize_with = "nullable")]
    pub rating_count: u32,
    /// Reference to the 3D model shown on the product page.
    #[serde(default, alias = "modelPath")]
    pub model_url: Option<String>,
    #[serde(default)]
    pub texture_config: serde_json::Value,
    #[serde(default, deserialize_with = "nullable")]
    pub colors: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// A product review (`reviews` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(deserialize_with = "string_or_number")]
    pub id: ReviewId,
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: ProductId,
    pub rating: Rating,
    pub comment: String,
    /// Set for reviews written from a confirmed order.
    #[serde(default, deserialize_with = "nullable")]
    pub is_verified: bool,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A review to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub rating: Rating,
    pub comment: String,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Product columns embedded in a review listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedProduct {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A review joined with the product it is about, used for testimonials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestReview {
    #[serde(flatten)]
    pub review: Review,
    #[serde(default)]
    pub products: Option<ReviewedProduct>,
}

impl LatestReview {
    #[must_use]
    pub fn author(&self) -> &str {
        self.review.user_name.as_deref().unwrap_or("Anonymous")
    }

    #[must_use]
    pub fn product_name(&self) -> &str {
        self.products.as_ref().map_or("Product", |p| p.name.as_str())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// An order to insert. Built from a cart snapshot at checkout.
///
/// There is no status field: gateways always store new orders as
/// [`OrderStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub phone_number: PhoneNumber,
    pub wilaya: String,
    /// Municipality.
    pub baladiya: String,
    pub exact_address: String,
    pub items: Vec<CartLineItem>,
    /// Cart total, excluding shipping.
    pub total_price: Price,
    pub shipping_cost: Price,
}

/// A stored order (`orders` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "string_or_number")]
    pub id: OrderId,
    pub customer_name: String,
    pub phone_number: String,
    pub wilaya: String,
    pub baladiya: String,
    pub exact_address: String,
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<CartLineItem>,
    pub total_price: Price,
    #[serde(default, deserialize_with = "nullable")]
    pub shipping_cost: Price,
    #[serde(default, deserialize_with = "nullable")]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Items total plus delivery.
    #[must_use]
    pub fn grand_total(&self) -> Price {
        self.total_price.saturating_add(self.shipping_cost)
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

// =============================================================================
// Admin Reporting Views
// =============================================================================

/// Row of `total_revenue_view`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TotalRevenue {
    #[serde(default, deserialize_with = "nullable")]
    pub total_income: Price,
    #[serde(default, deserialize_with = "nullable")]
    pub total_orders_completed: u64,
}

/// Row of `daily_sales_view`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub sale_date: NaiveDate,
    #[serde(default, deserialize_with = "nullable")]
    pub daily_income: Price,
    #[serde(default, deserialize_with = "nullable")]
    pub orders_count: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_lenient_columns() {
        let json = r#"{
            "id": 7,
            "name": "Wool Winter Sweater",
            "price": 6800,
            "stock": null,
            "image_url": "/assets/images/sweater-gray.jpg",
            "rating": null,
            "reviewCount": 12,
            "model_url": "/models/sweater.glb",
            "colors": null
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "7");
        assert_eq!(product.price, Price::from_dinars(6800));
        assert_eq!(product.stock, 0);
        assert!(!product.in_stock());
        assert!(product.rating_average.abs() < f64::EPSILON);
        assert_eq!(product.rating_count, 12);
        assert!(product.colors.is_empty());
        assert_eq!(product.texture_config, serde_json::Value::Null);
    }

    #[test]
    fn test_product_accepts_local_aliases() {
        let json = r#"{"id": "1", "name": "Tee", "price": 2500,
                       "image": "/img/tee.jpg", "modelPath": "/models/tee.glb"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.image_url.as_deref(), Some("/img/tee.jpg"));
        assert_eq!(product.model_url.as_deref(), Some("/models/tee.glb"));
    }

    #[test]
    fn test_latest_review_with_embedded_product() {
        let json = r#"{
            "id": "r1", "product_id": "p1", "rating": 5,
            "comment": "Excellent quality", "is_verified": true,
            "user_name": null, "created_at": "2025-03-01T10:00:00+00:00",
            "products": {"name": "Premium Cotton T-Shirt", "image_url": null}
        }"#;

        let review: LatestReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.author(), "Anonymous");
        assert_eq!(review.product_name(), "Premium Cotton T-Shirt");
        assert_eq!(review.review.rating.stars(), 5);
        assert!(review.review.created_at.is_some());
    }

    #[test]
    fn test_review_rejects_out_of_range_rating() {
        let json = r#"{"id": "r1", "product_id": "p1", "rating": 0, "comment": "x"}"#;
        assert!(serde_json::from_str::<Review>(json).is_err());
    }

    #[test]
    fn test_new_review_omits_missing_user_name() {
        let review = NewReview {
            product_id: ProductId::new("p1"),
            rating: Rating::new(4).unwrap(),
            comment: "Good fit and fabric".to_string(),
            is_verified: false,
            user_name: None,
        };
        let json = serde_json::to_value(&review).unwrap();
        assert!(json.get("user_name").is_none());
        assert_eq!(json["rating"], 4);
    }

    #[test]
    fn test_order_grand_total_and_defaults() {
        let json = r#"{
            "id": 42, "customer_name": "Ahmed", "phone_number": "0561234567",
            "wilaya": "Alger", "baladiya": "El Biar", "exact_address": "12 Rue Didouche",
            "items": null, "total_price": 9000, "shipping_cost": 300
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id.as_str(), "42");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.grand_total(), Price::from_dinars(9300));
        assert_eq!(order.item_count(), 0);
    }

    #[test]
    fn test_reporting_rows_tolerate_nulls() {
        let revenue: TotalRevenue =
            serde_json::from_str(r#"{"total_income": null, "total_orders_completed": null}"#)
                .unwrap();
        assert_eq!(revenue, TotalRevenue::default());

        let day: DailySales = serde_json::from_str(
            r#"{"sale_date": "2025-03-01", "daily_income": 15500, "orders_count": 3}"#,
        )
        .unwrap();
        assert_eq!(day.daily_income, Price::from_dinars(15_500));
    }
}
