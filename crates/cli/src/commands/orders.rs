//! Order lookup.

use royshop_core::OrderId;
use royshop_storefront::error::AppError;
use royshop_storefront::gateway::DataGateway;
use royshop_storefront::state::AppState;
use royshop_storefront::storage::KeyValueStore;

use crate::render;

pub async fn show<G, S>(state: &AppState<G, S>, id: &OrderId) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let order = state
        .gateway()?
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(render::order_detail(&order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use royshop_core::ProductId;
    use royshop_storefront::checkout::CheckoutForm;

    use super::*;
    use crate::commands::test_support::online;

    #[tokio::test]
    async fn test_show_placed_order() {
        let mut state = online();
        state
            .add_to_cart(&ProductId::new("5"), None, None, 2)
            .await
            .unwrap();
        let order = state
            .place_order(
                &CheckoutForm {
                    customer_name: "Lina Saidi".to_string(),
                    phone: "0699887766".to_string(),
                    wilaya: "Tizi Ouzou".to_string(),
                    municipality: "Azazga".to_string(),
                    address: "Village Ait Bouada".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let text = show(&state, &order.id).await.unwrap();
        assert!(text.contains("Status:   pending (unpaid)"));
        assert!(text.contains("Azazga, Tizi Ouzou"));
    }

    #[tokio::test]
    async fn test_show_unknown_order() {
        let state = online();
        let result = show(&state, &OrderId::new("missing")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
