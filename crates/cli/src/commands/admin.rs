//! Sales dashboard commands.
//!
//! # Environment Variables
//!
//! - `ROYSHOP_ADMIN_PASSWORD` - Dashboard password; the dashboard is disabled
//!   when it is unset
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - Backend holding the orders

use royshop_core::OrderId;
use royshop_storefront::admin::{Dashboard, confirm_sale};
use royshop_storefront::error::{AppError, add_breadcrumb};
use royshop_storefront::gateway::DataGateway;
use royshop_storefront::state::AppState;
use royshop_storefront::storage::KeyValueStore;

use crate::render;

pub async fn dashboard<G, S>(state: &AppState<G, S>, password: &str) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let session = state.admin_gate().verify(password)?;
    let dashboard = Dashboard::load(state.gateway()?, &session).await?;
    Ok(render::dashboard(&dashboard))
}

pub async fn confirm<G, S>(
    state: &AppState<G, S>,
    password: &str,
    order_id: &OrderId,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let session = state.admin_gate().verify(password)?;
    add_breadcrumb("admin", "Confirming sale", Some(&[("order_id", order_id.as_str())]));

    let dashboard = confirm_sale(state.gateway()?, &session, order_id).await?;
    Ok(format!(
        "Order {order_id} marked as paid.\n\n{}",
        render::dashboard(&dashboard)
    ))
}
