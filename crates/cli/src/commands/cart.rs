//! Cart commands.
//!
//! Every change is written to the local store before the command returns,
//! so the cart survives between runs.

use royshop_core::ProductId;
use royshop_storefront::cart::LineKey;
use royshop_storefront::error::{AppError, add_breadcrumb};
use royshop_storefront::gateway::DataGateway;
use royshop_storefront::state::AppState;
use royshop_storefront::storage::KeyValueStore;

use crate::render;

pub fn show<G, S>(state: &AppState<G, S>) -> String
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    render::cart(state.cart())
}

pub async fn add<G, S>(
    state: &mut AppState<G, S>,
    id: &ProductId,
    color: Option<&str>,
    size: Option<&str>,
    quantity: i64,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let (line, _) = state.add_to_cart(id, color, size, quantity).await?;
    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("line", line.key.to_string().as_str())]),
    );

    Ok(format!(
        "Added {} ({}, {}).\n\n{}",
        line.name,
        line.key.color,
        line.key.size,
        render::cart(state.cart())
    ))
}

/// Find the cart line the user means. Colour and size match ignoring case.
fn existing_line<G, S>(
    state: &AppState<G, S>,
    id: String,
    color: &str,
    size: &str,
) -> Result<LineKey, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let product_id = ProductId::new(id);
    state
        .cart()
        .items()
        .iter()
        .map(|item| &item.key)
        .find(|key| {
            key.product_id == product_id
                && key.color.eq_ignore_ascii_case(color.trim())
                && key.size.eq_ignore_ascii_case(size.trim())
        })
        .cloned()
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "cart line {} (run `royshop cart show` to see what is in the cart)",
                LineKey::new(product_id, color, size)
            ))
        })
}

pub fn remove<G, S>(
    state: &mut AppState<G, S>,
    id: String,
    color: String,
    size: String,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let key = existing_line(state, id, &color, &size)?;

    state.cart_mut().remove_item(&key);
    add_breadcrumb("cart", "Removed item", Some(&[("line", key.to_string().as_str())]));
    Ok(render::cart(state.cart()))
}

pub fn update<G, S>(
    state: &mut AppState<G, S>,
    id: String,
    color: String,
    size: String,
    quantity: i64,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let key = existing_line(state, id, &color, &size)?;

    state.cart_mut().update_quantity(&key, quantity);
    Ok(render::cart(state.cart()))
}

pub fn clear<G, S>(state: &mut AppState<G, S>) -> String
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    state.cart_mut().clear();
    add_breadcrumb("cart", "Cleared cart", None);
    render::cart(state.cart())
}
