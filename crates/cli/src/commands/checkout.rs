//! Cash-on-delivery checkout.

use chrono::{DateTime, Utc};
use royshop_storefront::checkout::CheckoutForm;
use royshop_storefront::error::{AppError, add_breadcrumb};
use royshop_storefront::gateway::DataGateway;
use royshop_storefront::state::AppState;
use royshop_storefront::storage::KeyValueStore;

use crate::render;

pub async fn place<G, S>(
    state: &mut AppState<G, S>,
    form: &CheckoutForm,
    now: DateTime<Utc>,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let lines = state.cart().len().to_string();
    add_breadcrumb(
        "checkout",
        "Submitting order",
        Some(&[("wilaya", form.wilaya.as_str()), ("lines", lines.as_str())]),
    );

    let order = state.place_order(form, now).await?;
    Ok(render::order_confirmation(&order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use royshop_core::ProductId;

    use super::*;
    use crate::commands::test_support::{offline, online};

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: "Yacine Mebarki".to_string(),
            phone: "05 51 23 45 67".to_string(),
            wilaya: "16".to_string(),
            municipality: "Hydra".to_string(),
            address: "12 rue des Pins".to_string(),
        }
    }

    #[tokio::test]
    async fn test_place_order() {
        let mut state = online();
        state
            .add_to_cart(&ProductId::new("2"), None, None, 1)
            .await
            .unwrap();

        let text = place(&mut state, &form(), Utc::now()).await.unwrap();
        assert!(text.contains("Thank you, Yacine Mebarki!"));
        assert!(state.cart().is_empty());
        assert_eq!(state.gateway().unwrap().orders().len(), 1);
    }

    #[tokio::test]
    async fn test_second_order_blocked_by_cooldown() {
        let mut state = online();
        let now = Utc::now();
        state
            .add_to_cart(&ProductId::new("2"), None, None, 1)
            .await
            .unwrap();
        place(&mut state, &form(), now).await.unwrap();

        state
            .add_to_cart(&ProductId::new("4"), None, None, 1)
            .await
            .unwrap();
        let result = place(&mut state, &form(), now + chrono::TimeDelta::seconds(30)).await;
        let Err(AppError::Checkout(fields)) = result else {
            panic!("expected field errors");
        };
        assert!(fields.to_string().contains("Please wait 270 seconds"));
        assert_eq!(state.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_cart() {
        let mut state = online();
        state
            .add_to_cart(&ProductId::new("2"), None, None, 1)
            .await
            .unwrap();
        state.gateway().unwrap().set_offline(true);

        let result = place(&mut state, &form(), Utc::now()).await;
        assert!(matches!(result, Err(AppError::Remote(_))));
        assert_eq!(state.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_reports_configuration() {
        let mut state = offline();
        let result = place(&mut state, &form(), Utc::now()).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
