//! Catalog browsing.

use royshop_core::ProductId;
use royshop_storefront::catalog::CatalogQuery;
use royshop_storefront::error::{AppError, add_breadcrumb};
use royshop_storefront::gateway::DataGateway;
use royshop_storefront::reviews::{ReviewStats, recent};
use royshop_storefront::state::AppState;
use royshop_storefront::storage::KeyValueStore;
use tracing::warn;

use crate::render;

/// Reviews shown under a product.
const RECENT_REVIEWS: usize = 3;

pub async fn list<G, S>(
    state: &AppState<G, S>,
    limit: Option<usize>,
    offset: usize,
) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    let page = state.catalog().list(CatalogQuery { limit, offset }).await?;
    Ok(render::product_list(&page))
}

pub async fn show<G, S>(state: &AppState<G, S>, id: &ProductId) -> Result<String, AppError>
where
    G: DataGateway,
    S: KeyValueStore + Clone,
{
    add_breadcrumb("catalog", "Viewed product", Some(&[("product_id", id.as_str())]));

    let (product, source) = state
        .catalog()
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    // The page still renders when reviews cannot be loaded
    let reviews = match state.gateway() {
        Ok(gateway) => gateway.list_reviews(id).await.unwrap_or_else(|e| {
            warn!(error = %e, product_id = %id, "Failed to load reviews");
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };
    let stats = ReviewStats::from_reviews(&reviews);

    Ok(render::product_detail(
        &product,
        source,
        &stats,
        recent(&reviews, RECENT_REVIEWS),
    ))
}
