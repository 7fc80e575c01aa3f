//! Hosted backend client.
//!
//! Talks to the `PostgREST` interface of the hosted project with `reqwest`.
//! Catalog reads are cached with `moka` (5-minute TTL); reviews, orders and
//! admin views always go to the network.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use royshop_core::{OrderId, OrderStatus, PaymentStatus, ProductId};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    DailySales, LatestReview, NewOrder, NewReview, Order, Product, Review, TotalRevenue,
};
use super::{DataGateway, GatewayError, snippet};
use crate::config::SupabaseConfig;

use cache::{CacheKey, CacheValue};

const PRODUCTS: &str = "products";
const REVIEWS: &str = "reviews";
const ORDERS: &str = "orders";
const TOTAL_REVENUE_VIEW: &str = "total_revenue_view";
const DAILY_SALES_VIEW: &str = "daily_sales_view";

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for the hosted `PostgREST` backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    rest_url: Url,
    anon_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl SupabaseClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                rest_url: rest_base(&config.url),
                anon_key: config.anon_key.clone(),
                cache,
            }),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.inner.anon_key.expose_secret();
        request
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept", "application/json")
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, GatewayError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited(retry_after(response.headers())));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %snippet(&body, 500),
                "Backend returned non-success status"
            );
            return Err(api_error(status.as_u16(), &body));
        }

        Ok(body)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GatewayError> {
        let url = endpoint_url(&self.inner.rest_url, table, query);
        let body = self.send(self.inner.client.get(url)).await?;
        parse_rows(&body)
    }

    async fn insert<B, T>(&self, table: &str, rows: &B) -> Result<Vec<T>, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint_url(&self.inner.rest_url, table, &[]);
        let request = self
            .inner
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(rows);
        parse_rows(&self.send(request).await?)
    }

    async fn update<B, T>(
        &self,
        table: &str,
        query: &[(&str, &str)],
        patch: &B,
    ) -> Result<Vec<T>, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint_url(&self.inner.rest_url, table, query);
        let request = self
            .inner
            .client
            .patch(url)
            .header("Prefer", "return=representation")
            .json(patch);
        parse_rows(&self.send(request).await?)
    }
}

impl DataGateway for SupabaseClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .select(PRODUCTS, &[("select", "*"), ("order", "created_at.desc")])
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, GatewayError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let filter = format!("eq.{id}");
        let product = self
            .select::<Product>(PRODUCTS, &[("select", "*"), ("id", filter.as_str()), ("limit", "1")])
            .await?
            .into_iter()
            .next();

        if let Some(product) = &product {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, GatewayError> {
        let filter = format!("eq.{product_id}");
        self.select(
            REVIEWS,
            &[
                ("select", "*"),
                ("product_id", filter.as_str()),
                ("order", "created_at.desc"),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn latest_reviews(&self, limit: usize) -> Result<Vec<LatestReview>, GatewayError> {
        let limit = limit.to_string();
        self.select(
            REVIEWS,
            &[
                ("select", "*,products(name,image_url)"),
                ("is_verified", "eq.true"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ],
        )
        .await
    }

    #[instrument(skip(self, review), fields(product_id = %review.product_id))]
    async fn create_review(&self, review: &NewReview) -> Result<Review, GatewayError> {
        self.insert::<_, Review>(REVIEWS, std::slice::from_ref(review))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound("review insert returned no row".to_string()))
    }

    #[instrument(skip(self, reviews), fields(count = reviews.len()))]
    async fn create_reviews(&self, reviews: &[NewReview]) -> Result<Vec<Review>, GatewayError> {
        if reviews.is_empty() {
            return Ok(Vec::new());
        }
        self.insert(REVIEWS, reviews).await
    }

    #[instrument(skip(self, order), fields(wilaya = %order.wilaya, lines = order.items.len()))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, GatewayError> {
        #[derive(Serialize)]
        struct OrderInsert<'a> {
            #[serde(flatten)]
            order: &'a NewOrder,
            status: OrderStatus,
        }

        let row = OrderInsert {
            order,
            status: OrderStatus::Pending,
        };
        self.insert::<_, Order>(ORDERS, std::slice::from_ref(&row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound("order insert returned no row".to_string()))
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, GatewayError> {
        let filter = format!("eq.{id}");
        Ok(self
            .select::<Order>(ORDERS, &[("select", "*"), ("id", filter.as_str()), ("limit", "1")])
            .await?
            .into_iter()
            .next())
    }

    #[instrument(skip(self))]
    async fn total_revenue(&self) -> Result<TotalRevenue, GatewayError> {
        Ok(self
            .select::<TotalRevenue>(TOTAL_REVENUE_VIEW, &[("select", "*")])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn daily_sales(&self) -> Result<Vec<DailySales>, GatewayError> {
        self.select(
            DAILY_SALES_VIEW,
            &[("select", "*"), ("order", "sale_date.desc")],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn pending_orders(&self) -> Result<Vec<Order>, GatewayError> {
        let filter = format!("eq.{}", PaymentStatus::Unpaid.code());
        self.select(
            ORDERS,
            &[
                ("select", "*"),
                ("payment_status", filter.as_str()),
                ("order", "created_at.desc"),
            ],
        )
        .await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn confirm_payment(&self, id: &OrderId) -> Result<(), GatewayError> {
        #[derive(Serialize)]
        struct PaymentPatch {
            payment_status: PaymentStatus,
        }

        let filter = format!("eq.{id}");
        let updated: Vec<serde_json::Value> = self
            .update(
                ORDERS,
                &[("id", filter.as_str())],
                &PaymentPatch {
                    payment_status: PaymentStatus::Paid,
                },
            )
            .await?;

        if updated.is_empty() {
            return Err(GatewayError::NotFound(format!("order {id}")));
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `https://<project>.supabase.co` -> `https://<project>.supabase.co/rest/v1/`
fn rest_base(project_url: &Url) -> Url {
    let path = format!("{}/rest/v1/", project_url.path().trim_end_matches('/'));
    let mut base = project_url.clone();
    base.set_path(&path);
    base.set_query(None);
    base.set_fragment(None);
    base
}

fn endpoint_url(base: &Url, table: &str, query: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    url.set_path(&format!("{}{table}", base.path()));
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url
}

fn retry_after(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(1)
}

/// Build an [`GatewayError::Api`] from a `PostgREST` error body, falling
/// back to the raw text when the body is not the usual JSON shape.
fn api_error(status: u16, body: &str) -> GatewayError {
    #[derive(Deserialize)]
    struct PostgrestError {
        message: String,
        #[serde(default)]
        hint: Option<String>,
    }

    let message = match serde_json::from_str::<PostgrestError>(body) {
        Ok(PostgrestError {
            message,
            hint: Some(hint),
        }) => format!("{message} ({hint})"),
        Ok(PostgrestError { message, hint: None }) => message,
        Err(_) => snippet(body, 200),
    };

    GatewayError::Api { status, message }
}

fn parse_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, GatewayError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %snippet(body, 500),
            "Failed to parse backend response"
        );
        GatewayError::Parse(e)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn base() -> Url {
        rest_base(&Url::parse("https://abc.supabase.co").unwrap())
    }

    #[test]
    fn test_rest_base() {
        assert_eq!(base().as_str(), "https://abc.supabase.co/rest/v1/");

        let with_slash = rest_base(&Url::parse("https://abc.supabase.co/").unwrap());
        assert_eq!(with_slash, base());

        let proxied = rest_base(&Url::parse("http://localhost:54321/project?x=1").unwrap());
        assert_eq!(proxied.as_str(), "http://localhost:54321/project/rest/v1/");
    }

    #[test]
    fn test_endpoint_url_with_filters() {
        let url = endpoint_url(&base(), "products", &[("id", "eq.7"), ("limit", "1")]);
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/products?id=eq.7&limit=1"
        );
    }

    #[test]
    fn test_endpoint_url_without_query() {
        let url = endpoint_url(&base(), "orders", &[]);
        assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/orders");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), 1);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(retry_after(&headers), 30);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), 1);
    }

    #[test]
    fn test_api_error_from_postgrest_body() {
        let body = r#"{"code":"42501","message":"permission denied for table orders","hint":"Check RLS policies","details":null}"#;
        let err = api_error(403, body);
        assert_eq!(
            err.to_string(),
            "API error (403): permission denied for table orders (Check RLS policies)"
        );
    }

    #[test]
    fn test_api_error_from_plain_body() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (502): Bad Gateway");
    }

    #[test]
    fn test_parse_rows() {
        let rows: Vec<TotalRevenue> =
            parse_rows(r#"[{"total_income": 20000, "total_orders_completed": 4}]"#).unwrap();
        assert_eq!(rows.len(), 1);

        assert!(matches!(
            parse_rows::<TotalRevenue>("<html>"),
            Err(GatewayError::Parse(_))
        ));
    }
}
