//! Remote data gateway.
//!
//! The storefront reads and writes products, reviews and orders through the
//! [`DataGateway`] trait. Two implementations ship with the crate:
//!
//! - [`SupabaseClient`]: the hosted `PostgREST` backend, with a 5 minute
//!   in-memory product cache (`moka`)
//! - [`MemoryGateway`]: an in-process backend used by tests and offline runs
//!
//! # Example
//!
//! ```rust,ignore
//! use royshop_storefront::gateway::{DataGateway, SupabaseClient};
//!
//! let client = SupabaseClient::new(&supabase_config);
//! let products = client.list_products().await?;
//! ```

mod memory;
mod supabase;
pub mod types;

use std::future::Future;

pub use memory::MemoryGateway;
pub use supabase::SupabaseClient;
pub use types::*;

use royshop_core::{OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A write returned no row, or a keyed lookup had to succeed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl GatewayError {
    /// Whether retrying the same call later might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::NotFound(_) => false,
        }
    }
}

/// Operations the storefront needs from its backing store.
///
/// Reads that may legitimately find nothing return `Ok(None)`; transport
/// and server failures are always `Err`. Implementations must be usable
/// from multi-threaded runtimes, hence the `Send` futures.
pub trait DataGateway {
    /// All catalog products, newest first.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, GatewayError>> + Send;

    /// A single product.
    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, GatewayError>> + Send;

    /// Reviews of one product, newest first.
    fn list_reviews(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Vec<Review>, GatewayError>> + Send;

    /// The most recent verified reviews across all products.
    fn latest_reviews(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LatestReview>, GatewayError>> + Send;

    /// Insert one review and return the stored row.
    fn create_review(
        &self,
        review: &NewReview,
    ) -> impl Future<Output = Result<Review, GatewayError>> + Send;

    /// Insert several reviews in one request.
    fn create_reviews(
        &self,
        reviews: &[NewReview],
    ) -> impl Future<Output = Result<Vec<Review>, GatewayError>> + Send;

    /// Insert an order and return the stored row.
    fn create_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, GatewayError>> + Send;

    /// A single order.
    fn get_order(
        &self,
        id: &OrderId,
    ) -> impl Future<Output = Result<Option<Order>, GatewayError>> + Send;

    /// Lifetime revenue over paid orders.
    fn total_revenue(&self) -> impl Future<Output = Result<TotalRevenue, GatewayError>> + Send;

    /// Paid revenue grouped by day, most recent first.
    fn daily_sales(&self) -> impl Future<Output = Result<Vec<DailySales>, GatewayError>> + Send;

    /// Orders whose payment has not been confirmed, newest first.
    fn pending_orders(&self) -> impl Future<Output = Result<Vec<Order>, GatewayError>> + Send;

    /// Mark an order as paid.
    fn confirm_payment(
        &self,
        id: &OrderId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Truncate a response body for logs and error messages.
pub(crate) fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
