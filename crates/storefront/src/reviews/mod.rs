//! Product reviews.
//!
//! Anyone can leave an unverified review from a product page. Customers
//! reviewing the products of their own order produce verified reviews,
//! which are the only ones shown in the landing-page testimonials.

mod form;
mod stats;

pub use form::{
    ANONYMOUS_CUSTOMER, MIN_COMMENT_CHARS, OrderReviewDraft, ReviewForm, prepare_order_reviews,
};
pub use stats::{ReviewStats, by_rating, recent};

use thiserror::Error;
use tracing::{info, instrument};

use crate::gateway::{DataGateway, GatewayError, Review};

/// Errors submitting reviews.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The input needs fixing; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("failed to submit review: {0}")]
    Remote(#[from] GatewayError),
}

/// Validate and submit a single review.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] for bad input and
/// [`ReviewError::Remote`] if the backend rejects the insert.
#[instrument(skip_all, fields(product_id = %form.product_id))]
pub async fn submit_review<G: DataGateway>(
    gateway: &G,
    form: ReviewForm,
) -> Result<Review, ReviewError> {
    let review = form.into_review()?;
    let stored = gateway.create_review(&review).await?;
    info!(review_id = %stored.id, rating = stored.rating.stars(), "Review submitted");
    Ok(stored)
}

/// Submit every pending draft in one request and mark them submitted.
///
/// Drafts are only marked once the backend has accepted the whole batch.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] if nothing is ready to send or a
/// rated draft is incomplete, and [`ReviewError::Remote`] if the insert fails.
#[instrument(skip_all, fields(drafts = drafts.len()))]
pub async fn submit_order_reviews<G: DataGateway>(
    gateway: &G,
    drafts: &mut [OrderReviewDraft],
    customer_name: Option<&str>,
) -> Result<Vec<Review>, ReviewError> {
    let reviews = prepare_order_reviews(drafts, customer_name)?;
    let stored = gateway.create_reviews(&reviews).await?;

    for draft in drafts.iter_mut().filter(|d| d.is_pending()) {
        draft.submitted = true;
    }

    info!(count = stored.len(), "Order reviews submitted");
    Ok(stored)
}
