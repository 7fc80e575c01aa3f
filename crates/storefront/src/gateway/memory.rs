//! In-memory implementation of [`DataGateway`].
//!
//! [`MemoryGateway`] keeps products, reviews and orders in process memory
//! with the same ordering and filtering as the hosted backend. It backs the
//! test suites and can be switched "offline" to exercise failure paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use royshop_core::{OrderId, OrderStatus, PaymentStatus, Price, ProductId, ReviewId};

use super::types::{
    DailySales, LatestReview, NewOrder, NewReview, Order, Product, Review, ReviewedProduct,
    TotalRevenue,
};
use super::{DataGateway, GatewayError};

#[derive(Debug, Default)]
struct State {
    products: Vec<Product>,
    /// Insertion order; newest last.
    reviews: Vec<Review>,
    /// Insertion order; newest last.
    orders: Vec<Order>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn insert_review(&mut self, review: &NewReview) -> Review {
        let stored = Review {
            id: ReviewId::new(self.next_id()),
            product_id: review.product_id.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            is_verified: review.is_verified,
            user_name: review.user_name.clone(),
            created_at: Some(Utc::now()),
        };
        self.reviews.push(stored.clone());
        stored
    }
}

/// An in-process [`DataGateway`].
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose catalog holds `products`.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            state: Mutex::new(State {
                products,
                ..State::default()
            }),
            offline: AtomicBool::new(false),
        }
    }

    /// While offline every call fails with a 503.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of stored orders, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    /// Snapshot of stored reviews, oldest first.
    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        self.lock().reviews.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> Result<MutexGuard<'_, State>, GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 503,
                message: "backend offline".to_string(),
            });
        }
        Ok(self.lock())
    }
}

impl DataGateway for MemoryGateway {
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError> {
        Ok(self.online()?.products.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, GatewayError> {
        Ok(self
            .online()?
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, GatewayError> {
        Ok(self
            .online()?
            .reviews
            .iter()
            .rev()
            .filter(|r| &r.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn latest_reviews(&self, limit: usize) -> Result<Vec<LatestReview>, GatewayError> {
        let state = self.online()?;
        Ok(state
            .reviews
            .iter()
            .rev()
            .filter(|r| r.is_verified)
            .take(limit)
            .map(|review| LatestReview {
                review: review.clone(),
                products: state
                    .products
                    .iter()
                    .find(|p| p.id == review.product_id)
                    .map(|p| ReviewedProduct {
                        name: p.name.clone(),
                        image_url: p.image_url.clone(),
                    }),
            })
            .collect())
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review, GatewayError> {
        Ok(self.online()?.insert_review(review))
    }

    async fn create_reviews(&self, reviews: &[NewReview]) -> Result<Vec<Review>, GatewayError> {
        let mut state = self.online()?;
        Ok(reviews.iter().map(|r| state.insert_review(r)).collect())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, GatewayError> {
        let mut state = self.online()?;
        let stored = Order {
            id: OrderId::new(state.next_id()),
            customer_name: order.customer_name.clone(),
            phone_number: order.phone_number.as_str().to_string(),
            wilaya: order.wilaya.clone(),
            baladiya: order.baladiya.clone(),
            exact_address: order.exact_address.clone(),
            items: order.items.clone(),
            total_price: order.total_price,
            shipping_cost: order.shipping_cost,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            created_at: Some(Utc::now()),
        };
        state.orders.push(stored.clone());
        Ok(stored)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, GatewayError> {
        Ok(self.online()?.orders.iter().find(|o| &o.id == id).cloned())
    }

    /// Sums the grand total (items and delivery) of paid orders.
    async fn total_revenue(&self) -> Result<TotalRevenue, GatewayError> {
        let state = self.online()?;
        let paid = || {
            state
                .orders
                .iter()
                .filter(|o| o.payment_status == PaymentStatus::Paid)
        };
        Ok(TotalRevenue {
            total_income: paid().map(Order::grand_total).sum(),
            total_orders_completed: paid().count() as u64,
        })
    }

    async fn daily_sales(&self) -> Result<Vec<DailySales>, GatewayError> {
        let state = self.online()?;
        let mut days: BTreeMap<NaiveDate, (Price, u64)> = BTreeMap::new();

        for order in &state.orders {
            if order.payment_status != PaymentStatus::Paid {
                continue;
            }
            let Some(created_at) = order.created_at else {
                continue;
            };
            let day = days.entry(created_at.date_naive()).or_insert((Price::ZERO, 0));
            day.0 = day.0.saturating_add(order.grand_total());
            day.1 += 1;
        }

        Ok(days
            .into_iter()
            .rev()
            .map(|(sale_date, (daily_income, orders_count))| DailySales {
                sale_date,
                daily_income,
                orders_count,
            })
            .collect())
    }

    async fn pending_orders(&self) -> Result<Vec<Order>, GatewayError> {
        Ok(self
            .online()?
            .orders
            .iter()
            .rev()
            .filter(|o| o.payment_status == PaymentStatus::Unpaid)
            .cloned()
            .collect())
    }

    async fn confirm_payment(&self, id: &OrderId) -> Result<(), GatewayError> {
        let mut state = self.online()?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("order {id}")))?;
        order.payment_status = PaymentStatus::Paid;
        Ok(())
    }
}
