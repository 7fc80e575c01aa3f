//! Product reviews.

use std::str::FromStr;

use royshop_core::{OrderId, ProductId};
use royshop_storefront::error::{AppError, add_breadcrumb};
use royshop_storefront::gateway::DataGateway;
use royshop_storefront::reviews::{
    OrderReviewDraft, ReviewForm, ReviewStats, submit_order_reviews, submit_review,
};
use royshop_storefront::state::AppState;
use royshop_storefront::storage::KeyValueStore;
use thiserror::Error;

use crate::render;

/// A `--rate` argument could not be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatingArgError {
    #[error("expected <product-id>=<stars>:<comment>")]
    Malformed,

    #[error("stars must be a number from 1 to 5, got '{0}'")]
    InvalidStars(String),
}

/// One product rating given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingArg {
    pub product_id: ProductId,
    pub rating: u8,
    pub comment: String,
}

impl FromStr for RatingArg {
    type Err = RatingArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product_id, rest) = s.split_once('=').ok_or(RatingArgError::Malformed)?;
        let (stars, comment) = rest.split_once(':').ok_or(RatingArgError::Malformed)?;
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(RatingArgError::Malformed);
        }
        let rating = stars
            .trim()
            .parse::<u8>()
            .map_err(|_| RatingArgError::InvalidStars(stars.trim().to_string()))?;

        Ok(Self {
            product_id: ProductId::new(product_id),
            rating,
            comment: comment.to_string(),
        })
    }
}

pub async fn list<G, S>(state: &AppState<G, S>, product_id: &ProductId) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let reviews = state.gateway()?.list_reviews(product_id).await?;
    let stats = ReviewStats::from_reviews(&reviews);
    Ok(render::reviews(&stats, &reviews))
}

pub async fn add<G, S>(
    state: &AppState<G, S>,
    product_id: ProductId,
    rating: u8,
    comment: String,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    add_breadcrumb(
        "reviews",
        "Submitting review",
        Some(&[("product_id", product_id.as_str())]),
    );
    let form = ReviewForm {
        product_id,
        rating,
        comment,
    };
    submit_review(state.gateway()?, form).await?;
    Ok("Thanks! Your review has been submitted.".to_string())
}

pub async fn latest<G, S>(state: &AppState<G, S>, limit: usize) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let reviews = state.gateway()?.latest_reviews(limit).await?;
    Ok(render::latest_reviews(&reviews))
}

/// Review the products of a placed order. Reviews are verified and signed
/// with the order's customer name.
pub async fn order<G, S>(
    state: &AppState<G, S>,
    order_id: &OrderId,
    rates: Vec<RatingArg>,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let gateway = state.gateway()?;
    let order = gateway
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let mut drafts = OrderReviewDraft::from_order_items(&order.items);
    for rate in rates {
        let draft = drafts
            .iter_mut()
            .find(|d| d.product_id == rate.product_id)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Product {} is not part of order {order_id}",
                    rate.product_id
                ))
            })?;
        draft.rating = rate.rating;
        draft.comment = rate.comment;
    }

    add_breadcrumb(
        "reviews",
        "Submitting order reviews",
        Some(&[("order_id", order_id.as_str())]),
    );
    let stored = submit_order_reviews(gateway, &mut drafts, Some(&order.customer_name)).await?;
    Ok(render::order_reviews_submitted(&drafts, stored.len()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use royshop_storefront::checkout::CheckoutForm;

    use super::*;
    use crate::commands::test_support::{TestState, offline, online};

    async fn placed_order(state: &mut TestState) -> OrderId {
        state
            .add_to_cart(&ProductId::new("1"), None, None, 1)
            .await
            .unwrap();
        state
            .add_to_cart(&ProductId::new("6"), None, None, 1)
            .await
            .unwrap();
        state
            .place_order(
                &CheckoutForm {
                    customer_name: "Rania Bouzid".to_string(),
                    phone: "0550001122".to_string(),
                    wilaya: "Constantine".to_string(),
                    municipality: "El Khroub".to_string(),
                    address: "Cité 500 logements".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_rating_arg_parse() {
        let arg: RatingArg = "3=5:Fits perfectly: great colour".parse().unwrap();
        assert_eq!(arg.product_id, ProductId::new("3"));
        assert_eq!(arg.rating, 5);
        assert_eq!(arg.comment, "Fits perfectly: great colour");

        assert_eq!("3".parse::<RatingArg>(), Err(RatingArgError::Malformed));
        assert_eq!("=5:x".parse::<RatingArg>(), Err(RatingArgError::Malformed));
        assert_eq!(
            "3=five:x".parse::<RatingArg>(),
            Err(RatingArgError::InvalidStars("five".to_string()))
        );
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let state = online();
        add(
            &state,
            ProductId::new("2"),
            4,
            "Solid denim, runs small".to_string(),
        )
        .await
        .unwrap();

        let text = list(&state, &ProductId::new("2")).await.unwrap();
        assert!(text.contains("4.0 out of 5 (1 reviews)"));
        assert!(text.contains("Solid denim"));
    }

    #[tokio::test]
    async fn test_add_requires_backend() {
        let state = offline();
        let result = add(&state, ProductId::new("2"), 4, "Solid denim".to_string()).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_order_reviews_are_verified() {
        let mut state = online();
        let order_id = placed_order(&mut state).await;

        let text = order(
            &state,
            &order_id,
            vec!["1=5:Soft cotton, true to size".parse().unwrap()],
        )
        .await
        .unwrap();
        assert!(text.contains("1 review(s) submitted"));
        assert!(text.contains("Not reviewed:"));

        let reviews = state.gateway().unwrap().reviews();
        assert_eq!(reviews.len(), 1);
        let review = reviews.first().unwrap();
        assert!(review.is_verified);
        assert_eq!(review.user_name.as_deref(), Some("Rania Bouzid"));
    }

    #[tokio::test]
    async fn test_order_review_for_foreign_product() {
        let mut state = online();
        let order_id = placed_order(&mut state).await;

        let result = order(
            &state,
            &order_id,
            vec!["8=5:Never bought this one".parse().unwrap()],
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
