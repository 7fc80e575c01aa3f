//! Application root.
//!
//! [`AppState`] owns the one cart, the cooldown and the data gateway for a
//! session. Front ends build it once and pass it down; nothing else creates
//! a [`Cart`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use royshop_core::ProductId;
use tracing::info;

use crate::admin::AdminGate;
use crate::cart::{Cart, CartLineItem};
use crate::catalog::{Catalog, CatalogSource, add_request};
use crate::checkout::{self, CheckoutForm, SubmissionCooldown};
use crate::config::{ConfigError, StorefrontConfig, SupabaseConfig};
use crate::error::{AppError, Result};
use crate::gateway::{DataGateway, Order, SupabaseClient};
use crate::storage::{FileStore, KeyValueStore};

/// Everything a storefront session needs.
///
/// The gateway is stored as a `Result` so a missing backend configuration
/// only fails the operations that need the backend.
pub struct AppState<G = SupabaseClient, S = Arc<FileStore>>
where
    S: KeyValueStore,
{
    config: StorefrontConfig,
    gateway: std::result::Result<G, ConfigError>,
    cart: Cart<S>,
    cooldown: SubmissionCooldown<S>,
    admin_gate: AdminGate,
}

impl AppState {
    /// Build the production state: a file store under `config.data_dir` and a
    /// Supabase gateway configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if the data directory cannot be
    /// created. Missing backend variables are not an error here.
    pub fn from_config(config: StorefrontConfig) -> Result<Self> {
        let store = Arc::new(FileStore::open(config.data_dir.clone())?);
        let gateway = SupabaseConfig::from_env().map(|c| SupabaseClient::new(&c));
        if let Err(e) = &gateway {
            info!(error = %e, "Backend not configured, running with the offline catalog");
        }
        Ok(Self::new(config, gateway, store))
    }
}

impl<G, S> AppState<G, S>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    /// Assemble a state from parts. The cart is loaded from `store`.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        gateway: std::result::Result<G, ConfigError>,
        store: S,
    ) -> Self {
        let admin_gate = AdminGate::from_config(&config);
        Self {
            config,
            gateway,
            cart: Cart::load(store.clone()),
            cooldown: SubmissionCooldown::new(store),
            admin_gate,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// The data gateway.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] naming the missing variable when
    /// the backend is not configured.
    pub fn gateway(&self) -> Result<&G> {
        self.gateway
            .as_ref()
            .map_err(|e| AppError::Configuration(e.clone()))
    }

    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.gateway.is_ok()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart<S> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart<S> {
        &mut self.cart
    }

    #[must_use]
    pub const fn cooldown(&self) -> &SubmissionCooldown<S> {
        &self.cooldown
    }

    #[must_use]
    pub const fn admin_gate(&self) -> &AdminGate {
        &self.admin_gate
    }

    /// The catalog, backed by the gateway when one is configured.
    #[must_use]
    pub fn catalog(&self) -> Catalog<'_, G> {
        match &self.gateway {
            Ok(gateway) => Catalog::new(gateway),
            Err(_) => Catalog::bundled_only(),
        }
    }

    /// Look up a product and add the chosen configuration to the cart.
    ///
    /// An option left unset defaults to the product's first choice. Returns
    /// the resulting cart line and where the product came from.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown product and
    /// [`AppError::Validation`] for an option the product does not offer.
    pub async fn add_to_cart(
        &mut self,
        product_id: &ProductId,
        color: Option<&str>,
        size: Option<&str>,
        quantity: i64,
    ) -> Result<(CartLineItem, CatalogSource)> {
        let catalog = match &self.gateway {
            Ok(gateway) => Catalog::new(gateway),
            Err(_) => Catalog::bundled_only(),
        };
        let (product, source) = catalog
            .find(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

        let color = color.or_else(|| product.colors.first().map(String::as_str));
        let size = size.or_else(|| product.sizes.first().map(String::as_str));
        let request = add_request(
            &product,
            color.unwrap_or_default(),
            size.unwrap_or_default(),
            quantity,
        )?;
        let key = request.key.clone();
        self.cart.add_item(request);

        let line = self
            .cart
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("cart line {key}")))?;
        Ok((line, source))
    }

    /// Submit the cart as a cash-on-delivery order.
    ///
    /// # Errors
    ///
    /// See [`checkout::place_order`]; a missing backend configuration is
    /// reported before the form is validated.
    pub async fn place_order(&mut self, form: &CheckoutForm, now: DateTime<Utc>) -> Result<Order> {
        let gateway = self
            .gateway
            .as_ref()
            .map_err(|e| AppError::Configuration(e.clone()))?;
        let order =
            checkout::place_order(gateway, &mut self.cart, &self.cooldown, form, now).await?;
        Ok(order)
    }
}
