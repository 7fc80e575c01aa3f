//! Cash-on-delivery checkout.
//!
//! The flow is: validate the form against the current cart and cooldown,
//! snapshot the cart into a [`NewOrder`], create it remotely, and only then
//! record the submission time and empty the cart. A failed remote call
//! leaves the cart exactly as it was.

mod cooldown;
mod form;

pub use cooldown::{CooldownStatus, DEFAULT_WINDOW, SubmissionCooldown};
pub use form::{CheckoutField, CheckoutForm, FieldErrors, ValidatedCheckout, validate};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::Cart;
use crate::gateway::{DataGateway, GatewayError, NewOrder, Order};
use crate::storage::KeyValueStore;

/// Errors placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The form or cart is not ready; nothing was sent.
    #[error("checkout validation failed: {0}")]
    Validation(FieldErrors),

    /// The order could not be created; the cart is unchanged.
    #[error("failed to create order: {0}")]
    Remote(#[from] GatewayError),
}

/// Build the order payload from a validated form and the cart contents.
#[must_use]
pub fn build_order<S: KeyValueStore>(checkout: &ValidatedCheckout, cart: &Cart<S>) -> NewOrder {
    NewOrder {
        customer_name: checkout.customer_name.clone(),
        phone_number: checkout.phone.clone(),
        wilaya: checkout.wilaya.name.to_string(),
        baladiya: checkout.municipality.clone(),
        exact_address: checkout.address.clone(),
        items: cart.items().to_vec(),
        total_price: cart.total_price(),
        shipping_cost: checkout.shipping_cost(),
    }
}

/// Validate and submit an order.
///
/// On success the cooldown is recorded and the cart cleared. A failure to
/// record the cooldown is logged but does not fail the order, which has
/// already been created.
///
/// # Errors
///
/// Returns [`CheckoutError::Validation`] without side effects if the form is
/// invalid, and [`CheckoutError::Remote`] with the cart untouched if the
/// order could not be created.
#[instrument(skip_all)]
pub async fn place_order<G, S, C>(
    gateway: &G,
    cart: &mut Cart<S>,
    cooldown: &SubmissionCooldown<C>,
    form: &CheckoutForm,
    now: DateTime<Utc>,
) -> Result<Order, CheckoutError>
where
    G: DataGateway,
    S: KeyValueStore,
    C: KeyValueStore,
{
    let checkout =
        validate(form, cart.is_empty(), cooldown.status(now)).map_err(CheckoutError::Validation)?;

    let order = build_order(&checkout, cart);
    let created = gateway.create_order(&order).await?;

    info!(
        order_id = %created.id,
        wilaya = %created.wilaya,
        lines = created.items.len(),
        total = %created.grand_total(),
        "Order placed"
    );

    if let Err(e) = cooldown.record(now) {
        warn!(error = %e, "Failed to record order submission time");
    }
    cart.clear();

    Ok(created)
}
