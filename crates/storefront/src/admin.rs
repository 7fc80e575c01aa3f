//! Sales dashboard for shop staff.
//!
//! Access is gated by a shared password from `ROYSHOP_ADMIN_PASSWORD`. When
//! the variable is unset the dashboard is disabled entirely. A successful
//! [`AdminGate::verify`] yields an [`AdminSession`], which every dashboard
//! operation requires.

use royshop_core::{OrderId, Price};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::StorefrontConfig;
use crate::gateway::{DailySales, DataGateway, GatewayError, Order, TotalRevenue};

/// Errors from the admin dashboard.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin dashboard is disabled: set ROYSHOP_ADMIN_PASSWORD to enable it")]
    NotConfigured,

    #[error("incorrect admin password")]
    InvalidPassword,

    #[error("failed to load dashboard data: {0}")]
    Remote(#[from] GatewayError),
}

/// Proof that the admin password was checked.
#[derive(Debug)]
pub struct AdminSession {
    _private: (),
}

/// Password check for the dashboard.
#[derive(Clone)]
pub struct AdminGate {
    password: Option<SecretString>,
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AdminGate {
    #[must_use]
    pub const fn new(password: Option<SecretString>) -> Self {
        Self { password }
    }

    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self::new(config.admin_password.clone())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty())
    }

    /// Check `input` against the configured password.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NotConfigured`] when no password is set and
    /// [`AdminError::InvalidPassword`] on mismatch.
    pub fn verify(&self, input: &str) -> Result<AdminSession, AdminError> {
        let expected = self
            .password
            .as_ref()
            .map(|p| p.expose_secret())
            .filter(|p| !p.is_empty())
            .ok_or(AdminError::NotConfigured)?;

        if constant_time_eq(expected.as_bytes(), input.as_bytes()) {
            info!("Admin access granted");
            Ok(AdminSession { _private: () })
        } else {
            warn!("Rejected admin password");
            Err(AdminError::InvalidPassword)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Revenue figures and the orders awaiting payment confirmation.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub revenue: TotalRevenue,
    /// Most recent day first.
    pub daily_sales: Vec<DailySales>,
    /// Unpaid orders, newest first.
    pub pending_orders: Vec<Order>,
}

impl Dashboard {
    /// Load all dashboard data.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] if any of the reads fail.
    #[instrument(skip_all)]
    pub async fn load<G: DataGateway>(
        gateway: &G,
        _session: &AdminSession,
    ) -> Result<Self, AdminError> {
        let revenue = gateway.total_revenue().await?;
        let daily_sales = gateway.daily_sales().await?;
        let pending_orders = gateway.pending_orders().await?;

        Ok(Self {
            revenue,
            daily_sales,
            pending_orders,
        })
    }

    /// Cash still to be collected on pending orders, delivery included.
    #[must_use]
    pub fn pending_total(&self) -> Price {
        self.pending_orders.iter().map(Order::grand_total).sum()
    }
}

/// Mark an order as paid and reload the dashboard.
///
/// # Errors
///
/// Returns [`AdminError::Remote`] if the update or the reload fails.
#[instrument(skip(gateway, session), fields(order_id = %order_id))]
pub async fn confirm_sale<G: DataGateway>(
    gateway: &G,
    session: &AdminSession,
    order_id: &OrderId,
) -> Result<Dashboard, AdminError> {
    gateway.confirm_payment(order_id).await?;
    info!("Sale confirmed");
    Dashboard::load(gateway, session).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use royshop_core::PhoneNumber;

    use super::*;
    use crate::cart::{CartLineItem, LineKey};
    use crate::gateway::{MemoryGateway, NewOrder};

    fn gate() -> AdminGate {
        AdminGate::new(Some(SecretString::from("correct horse")))
    }

    fn order(total: i64) -> NewOrder {
        NewOrder {
            customer_name: "Sofiane".to_string(),
            phone_number: PhoneNumber::parse("0551234567").unwrap(),
            wilaya: "Blida".to_string(),
            baladiya: "Boufarik".to_string(),
            exact_address: "Route nationale 1".to_string(),
            items: vec![CartLineItem {
                key: LineKey::new("5", "Green", "M"),
                display_id: "d".to_string(),
                name: "Premium Polo Shirt".to_string(),
                unit_price: Price::from_dinars(total),
                quantity: 1,
                image: None,
            }],
            total_price: Price::from_dinars(total),
            shipping_cost: Price::from_dinars(400),
        }
    }

    #[test]
    fn test_gate_disabled_without_password() {
        let gate = AdminGate::new(None);
        assert!(!gate.is_enabled());
        assert!(matches!(gate.verify("anything"), Err(AdminError::NotConfigured)));

        let blank = AdminGate::new(Some(SecretString::from("")));
        assert!(matches!(blank.verify(""), Err(AdminError::NotConfigured)));
    }

    #[test]
    fn test_gate_checks_password() {
        let gate = gate();
        assert!(gate.is_enabled());
        assert!(gate.verify("correct horse").is_ok());
        assert!(matches!(gate.verify("correct"), Err(AdminError::InvalidPassword)));
        assert!(matches!(gate.verify(""), Err(AdminError::InvalidPassword)));
    }

    #[test]
    fn test_gate_debug_hides_password() {
        let output = format!("{:?}", gate());
        assert!(!output.contains("correct horse"));
        assert!(output.contains("enabled: true"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[tokio::test]
    async fn test_dashboard_and_confirm_sale() {
        let gateway = MemoryGateway::new();
        let first = gateway.create_order(&order(3800)).await.unwrap();
        gateway.create_order(&order(6800)).await.unwrap();

        let session = gate().verify("correct horse").unwrap();
        let dashboard = Dashboard::load(&gateway, &session).await.unwrap();
        assert_eq!(dashboard.pending_orders.len(), 2);
        assert_eq!(dashboard.pending_total(), Price::from_dinars(11_400));
        assert!(dashboard.revenue.total_income.is_zero());

        let dashboard = confirm_sale(&gateway, &session, &first.id).await.unwrap();
        assert_eq!(dashboard.pending_orders.len(), 1);
        assert_eq!(dashboard.revenue.total_income, Price::from_dinars(4200));
        assert_eq!(dashboard.revenue.total_orders_completed, 1);
        assert_eq!(dashboard.daily_sales.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_unknown_order() {
        let gateway = MemoryGateway::new();
        let session = gate().verify("correct horse").unwrap();
        let result = confirm_sale(&gateway, &session, &OrderId::new("404")).await;
        assert!(matches!(
            result,
            Err(AdminError::Remote(GatewayError::NotFound(_)))
        ));
    }
}
