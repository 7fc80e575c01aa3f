//! Product catalog with a bundled fallback.
//!
//! Products come from the hosted backend when it is reachable and has data.
//! Otherwise the catalog shipped in `content/products.json` is served so the
//! shop stays browsable offline. Every listing reports where it came from.

use std::fmt;

use royshop_core::ProductId;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::cart::{AddItem, LineKey};
use crate::gateway::{DataGateway, Product};

const BUNDLED_PRODUCTS: &str = include_str!("../content/products.json");

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("bundled catalog is malformed: {0}")]
    Bundled(#[from] serde_json::Error),
}

/// Where a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Remote,
    Bundled,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "live catalog"),
            Self::Bundled => write!(f, "offline catalog"),
        }
    }
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl CatalogQuery {
    fn apply(self, products: Vec<Product>) -> Vec<Product> {
        let page = products.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}

/// One page of products.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    /// Size of the full listing before pagination.
    pub total: usize,
    pub source: CatalogSource,
}

/// Parse the bundled catalog.
///
/// # Errors
///
/// Returns an error if the bundled JSON does not match [`Product`].
pub fn bundled_products() -> Result<Vec<Product>, CatalogError> {
    Ok(serde_json::from_str(BUNDLED_PRODUCTS)?)
}

/// Read access to the product catalog.
pub struct Catalog<'a, G> {
    gateway: Option<&'a G>,
}

impl<'a, G: DataGateway> Catalog<'a, G> {
    #[must_use]
    pub const fn new(gateway: &'a G) -> Self {
        Self {
            gateway: Some(gateway),
        }
    }

    /// A catalog that never calls the backend.
    #[must_use]
    pub const fn bundled_only() -> Self {
        Self { gateway: None }
    }

    /// List products.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled fallback is needed and broken.
    #[instrument(skip(self))]
    pub async fn list(&self, query: CatalogQuery) -> Result<CatalogPage, CatalogError> {
        let (products, source) = self.all().await?;
        let total = products.len();
        Ok(CatalogPage {
            products: query.apply(products),
            total,
            source,
        })
    }

    /// The first `count` products, for the landing page.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled fallback is needed and broken.
    pub async fn featured(&self, count: usize) -> Result<CatalogPage, CatalogError> {
        self.list(CatalogQuery {
            limit: Some(count),
            offset: 0,
        })
        .await
    }

    /// Look a product up by id, remote first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled fallback is needed and broken.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn find(
        &self,
        id: &ProductId,
    ) -> Result<Option<(Product, CatalogSource)>, CatalogError> {
        if let Some(gateway) = self.gateway {
            match gateway.get_product(id).await {
                Ok(Some(product)) => return Ok(Some((product, CatalogSource::Remote))),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Product lookup failed, using offline catalog"),
            }
        }

        Ok(bundled_products()?
            .into_iter()
            .find(|p| &p.id == id)
            .map(|p| (p, CatalogSource::Bundled)))
    }

    async fn all(&self) -> Result<(Vec<Product>, CatalogSource), CatalogError> {
        if let Some(gateway) = self.gateway {
            match gateway.list_products().await {
                Ok(products) if !products.is_empty() => {
                    return Ok((products, CatalogSource::Remote));
                }
                Ok(_) => warn!("Live catalog is empty, using offline catalog"),
                Err(e) => warn!(error = %e, "Failed to load live catalog, using offline catalog"),
            }
        }
        Ok((bundled_products()?, CatalogSource::Bundled))
    }
}

// =============================================================================
// Product Options
// =============================================================================

/// A colour or size the product is not sold in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("{product} is not available in colour '{requested}' (choose from: {available})")]
    Color {
        product: String,
        requested: String,
        available: String,
    },
    #[error("{product} is not available in size '{requested}' (choose from: {available})")]
    Size {
        product: String,
        requested: String,
        available: String,
    },
}

/// Match `requested` against `options` case-insensitively, returning the
/// catalog spelling. An empty option list accepts anything.
fn resolve(options: &[String], requested: &str) -> Option<String> {
    let requested = requested.trim();
    if options.is_empty() {
        return Some(requested.to_string());
    }
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(requested))
        .cloned()
}

/// Build a cart request for `product`, checking the chosen colour and size.
///
/// # Errors
///
/// Returns an error naming the valid choices if either option is not sold.
pub fn add_request(
    product: &Product,
    color: &str,
    size: &str,
    quantity: i64,
) -> Result<AddItem, OptionError> {
    let color = resolve(&product.colors, color).ok_or_else(|| OptionError::Color {
        product: product.name.clone(),
        requested: color.to_string(),
        available: product.colors.join(", "),
    })?;
    let size = resolve(&product.sizes, size).ok_or_else(|| OptionError::Size {
        product: product.name.clone(),
        requested: size.to_string(),
        available: product.sizes.join(", "),
    })?;

    let request = AddItem::new(
        LineKey::new(product.id.clone(), color, size),
        product.name.clone(),
        product.price,
    )
    .with_quantity(quantity);

    Ok(match &product.image_url {
        Some(image) => request.with_image(image.clone()),
        None => request,
    })
}
