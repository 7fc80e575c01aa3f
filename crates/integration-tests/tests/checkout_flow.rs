//! A customer's journey end to end: browse, fill the cart, order, review,
//! and the shop owner confirming the payment.

#![allow(clippy::unwrap_used)]

use chrono::{TimeDelta, Utc};
use royshop_core::{OrderStatus, PaymentStatus, Price, ProductId};
use royshop_integration_tests::{ADMIN_PASSWORD, file_session};
use royshop_storefront::admin::{Dashboard, confirm_sale};
use royshop_storefront::catalog::{CatalogQuery, CatalogSource, bundled_products};
use royshop_storefront::checkout::{CheckoutField, CheckoutForm, CooldownStatus};
use royshop_storefront::error::{AppError, ErrorKind};
use royshop_storefront::gateway::{DataGateway, MemoryGateway};
use royshop_storefront::reviews::{OrderReviewDraft, ReviewStats, submit_order_reviews};

fn live_gateway() -> MemoryGateway {
    MemoryGateway::with_products(bundled_products().unwrap())
}

fn form() -> CheckoutForm {
    CheckoutForm {
        customer_name: "Samir Ouali".to_string(),
        phone: "0661 23 45 67".to_string(),
        wilaya: "Béjaïa".to_string(),
        municipality: "Akbou".to_string(),
        address: "Rue de la Soummam 8".to_string(),
    }
}

#[tokio::test]
async fn test_browse_order_review_and_confirm() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = file_session(dir.path(), Ok(live_gateway()));

    // Browse
    let page = session
        .catalog()
        .list(CatalogQuery {
            limit: Some(4),
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(page.source, CatalogSource::Remote);
    assert_eq!(page.products.len(), 4);
    assert_eq!(page.total, 8);

    // Fill the cart, merging a repeated configuration
    session
        .add_to_cart(&ProductId::new("1"), Some("white"), Some("m"), 1)
        .await
        .unwrap();
    session
        .add_to_cart(&ProductId::new("1"), Some("White"), Some("M"), 1)
        .await
        .unwrap();
    session
        .add_to_cart(&ProductId::new("2"), None, None, 1)
        .await
        .unwrap();
    assert_eq!(session.cart().len(), 2);
    let subtotal = session.cart().total_price();

    // Order
    let now = Utc::now();
    let order = session.place_order(&form(), now).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.total_price, subtotal);
    assert_eq!(order.grand_total(), subtotal.saturating_add(order.shipping_cost));
    assert_eq!(order.item_count(), 3);
    assert!(session.cart().is_empty());

    // Review the order's products
    let gateway = session.gateway().unwrap();
    let mut drafts = OrderReviewDraft::from_order_items(&order.items);
    assert_eq!(drafts.len(), 2);
    for draft in &mut drafts {
        draft.rating = 5;
        draft.comment = "Arrived quickly, great quality".to_string();
    }
    let stored = submit_order_reviews(gateway, &mut drafts, Some(&order.customer_name))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);

    let latest = gateway.latest_reviews(6).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert!(latest.iter().all(|r| r.author() == "Samir Ouali"));

    let stats = ReviewStats::from_reviews(&gateway.list_reviews(&ProductId::new("1")).await.unwrap());
    assert_eq!(stats.total, 1);

    // Owner confirms the cash payment
    let admin = session.admin_gate().verify(ADMIN_PASSWORD).unwrap();
    let dashboard = Dashboard::load(gateway, &admin).await.unwrap();
    assert_eq!(dashboard.pending_orders.len(), 1);
    assert_eq!(dashboard.pending_total(), order.grand_total());

    let dashboard = confirm_sale(gateway, &admin, &order.id).await.unwrap();
    assert!(dashboard.pending_orders.is_empty());
    assert_eq!(dashboard.revenue.total_income, order.grand_total());
    assert_eq!(dashboard.revenue.total_orders_completed, 1);
}

#[tokio::test]
async fn test_cooldown_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();

    {
        let mut session = file_session(dir.path(), Ok(live_gateway()));
        session
            .add_to_cart(&ProductId::new("5"), None, None, 1)
            .await
            .unwrap();
        session.place_order(&form(), now).await.unwrap();
    }

    let mut session = file_session(dir.path(), Ok(live_gateway()));
    session
        .add_to_cart(&ProductId::new("6"), None, None, 1)
        .await
        .unwrap();

    let later = now + TimeDelta::seconds(61);
    assert_eq!(
        session.cooldown().status(later),
        CooldownStatus::Active {
            remaining_secs: 239
        }
    );

    let err = session.place_order(&form(), later).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let AppError::Checkout(fields) = err else {
        panic!("expected field errors");
    };
    assert!(fields.get(CheckoutField::Cooldown).is_some());
    assert_eq!(session.cart().len(), 1);

    // Window over
    let order = session
        .place_order(&form(), now + TimeDelta::minutes(5))
        .await
        .unwrap();
    assert_eq!(order.items.len(), 1);
}

#[tokio::test]
async fn test_failed_order_keeps_cart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut session = file_session(dir.path(), Ok(live_gateway()));
        session
            .add_to_cart(&ProductId::new("7"), None, None, 2)
            .await
            .unwrap();
        session.gateway().unwrap().set_offline(true);

        let err = session.place_order(&form(), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    let session = file_session(dir.path(), Ok(live_gateway()));
    assert_eq!(session.cart().total_item_count(), 2);
    assert_eq!(session.cooldown().status(Utc::now()), CooldownStatus::Ready);
}

#[tokio::test]
async fn test_catalog_falls_back_when_backend_is_down() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = live_gateway();
    gateway.set_offline(true);
    let mut session = file_session(dir.path(), Ok(gateway));

    let page = session.catalog().list(CatalogQuery::default()).await.unwrap();
    assert_eq!(page.source, CatalogSource::Bundled);

    let (line, source) = session
        .add_to_cart(&ProductId::new("8"), None, None, 1)
        .await
        .unwrap();
    assert_eq!(source, CatalogSource::Bundled);
    assert!(line.unit_price > Price::ZERO);
}
