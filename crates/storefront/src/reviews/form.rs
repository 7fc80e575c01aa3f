//! Review input: the single-product form and post-purchase drafts.

use royshop_core::{ProductId, Rating};

use super::ReviewError;
use crate::cart::CartLineItem;
use crate::gateway::NewReview;

/// Minimum comment length, counted in characters after trimming.
pub const MIN_COMMENT_CHARS: usize = 10;

/// Author name used for verified reviews when the customer gave none.
pub const ANONYMOUS_CUSTOMER: &str = "Anonymous Customer";

fn check_comment(comment: &str) -> Result<String, ReviewError> {
    let comment = comment.trim();
    if comment.chars().count() < MIN_COMMENT_CHARS {
        return Err(ReviewError::Validation(format!(
            "Please write at least {MIN_COMMENT_CHARS} characters"
        )));
    }
    Ok(comment.to_string())
}

/// A review written from a product page. Anonymous and unverified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewForm {
    pub product_id: ProductId,
    /// `0` means no star selected yet.
    pub rating: u8,
    pub comment: String,
}

impl ReviewForm {
    /// Validate the form into an insertable review.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Validation`] if no valid rating is selected or
    /// the comment is too short.
    pub fn into_review(self) -> Result<NewReview, ReviewError> {
        if self.rating == 0 {
            return Err(ReviewError::Validation(
                "Please select a star rating".to_string(),
            ));
        }
        let rating = Rating::new(i64::from(self.rating))
            .map_err(|e| ReviewError::Validation(e.to_string()))?;
        let comment = check_comment(&self.comment)?;

        Ok(NewReview {
            product_id: self.product_id,
            rating,
            comment,
            is_verified: false,
            user_name: None,
        })
    }
}

/// Review state for one product of a delivered order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReviewDraft {
    pub product_id: ProductId,
    pub product_name: String,
    /// `0` until the customer picks a star.
    pub rating: u8,
    pub comment: String,
    pub submitted: bool,
}

impl OrderReviewDraft {
    /// One draft per distinct product in the order, in order of appearance.
    #[must_use]
    pub fn from_order_items(items: &[CartLineItem]) -> Vec<Self> {
        let mut drafts: Vec<Self> = Vec::new();
        for item in items {
            if drafts.iter().any(|d| d.product_id == item.key.product_id) {
                continue;
            }
            drafts.push(Self {
                product_id: item.key.product_id.clone(),
                product_name: item.name.clone(),
                rating: 0,
                comment: String::new(),
                submitted: false,
            });
        }
        drafts
    }

    /// Rated and not yet sent.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.rating > 0 && !self.submitted
    }
}

/// Turn the pending drafts into verified reviews.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] if no draft is rated, or if any rated
/// draft has an invalid rating or a short comment.
pub fn prepare_order_reviews(
    drafts: &[OrderReviewDraft],
    customer_name: Option<&str>,
) -> Result<Vec<NewReview>, ReviewError> {
    let pending: Vec<&OrderReviewDraft> = drafts.iter().filter(|d| d.is_pending()).collect();
    if pending.is_empty() {
        return Err(ReviewError::Validation(
            "Please rate at least one product before submitting".to_string(),
        ));
    }

    let author = customer_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_CUSTOMER);

    pending
        .into_iter()
        .map(|draft| {
            let rating = Rating::new(i64::from(draft.rating))
                .map_err(|e| ReviewError::Validation(format!("{}: {e}", draft.product_name)))?;
            let comment = check_comment(&draft.comment).map_err(|_| {
                ReviewError::Validation(format!(
                    "Please add at least {MIN_COMMENT_CHARS} characters to the comment for {}",
                    draft.product_name
                ))
            })?;
            Ok(NewReview {
                product_id: draft.product_id.clone(),
                rating,
                comment,
                is_verified: true,
                user_name: Some(author.to_string()),
            })
        })
        .collect()
}
