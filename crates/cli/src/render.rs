//! Plain-text views.
//!
//! Every function returns the text to print so commands stay testable.

use royshop_core::{Rating, WILAYAS};
use royshop_storefront::admin::Dashboard;
use royshop_storefront::cart::Cart;
use royshop_storefront::catalog::{CatalogPage, CatalogSource};
use royshop_storefront::error::{AppError, ErrorKind};
use royshop_storefront::gateway::{LatestReview, Order, Product, Review};
use royshop_storefront::reviews::{OrderReviewDraft, ReviewStats};
use royshop_storefront::storage::KeyValueStore;

const BACK_TO_SHOP: &str = "Back to the shop: royshop products list";

/// Backend variables, with what to put in them.
const BACKEND_VARS: [(&str, &str); 2] = [
    ("SUPABASE_URL", "project URL, e.g. https://abcd.supabase.co"),
    ("SUPABASE_ANON_KEY", "the project's public anon key"),
];

fn stars(rating: Rating) -> String {
    let filled = usize::from(rating.stars());
    format!("{}{}", "★".repeat(filled), "☆".repeat(usize::from(Rating::MAX) - filled))
}

// =============================================================================
// Catalog
// =============================================================================

pub fn product_list(page: &CatalogPage) -> String {
    let mut lines = vec![format!(
        "{} of {} products ({})",
        page.products.len(),
        page.total,
        page.source
    )];

    if page.products.is_empty() {
        lines.push("No products on this page.".to_string());
    }

    for product in &page.products {
        let rating = if product.rating_count > 0 {
            format!("  {:.1}★ ({})", product.rating_average, product.rating_count)
        } else {
            String::new()
        };
        let stock = if product.in_stock() { "" } else { "  out of stock" };
        lines.push(format!(
            "  [{}] {}  {}{rating}{stock}",
            product.id, product.name, product.price
        ));
    }

    lines.join("\n")
}

pub fn product_detail(
    product: &Product,
    source: CatalogSource,
    stats: &ReviewStats,
    recent: &[Review],
) -> String {
    let mut lines = vec![
        format!("{} [{}]", product.name, product.id),
        format!("{}  ({source})", product.price),
    ];

    if let Some(description) = &product.description {
        lines.push(String::new());
        lines.push(description.clone());
    }
    lines.push(String::new());
    if !product.colors.is_empty() {
        lines.push(format!("Colours:  {}", product.colors.join(", ")));
    }
    if !product.sizes.is_empty() {
        lines.push(format!("Sizes:    {}", product.sizes.join(", ")));
    }
    if let Some(material) = &product.material {
        lines.push(format!("Material: {material}"));
    }
    if let Some(care) = &product.care {
        lines.push(format!("Care:     {care}"));
    }
    if !product.in_stock() {
        lines.push("Currently out of stock.".to_string());
    }

    lines.push(String::new());
    if stats.total == 0 {
        lines.push("No reviews yet.".to_string());
    } else {
        lines.push(format!("Rated {:.1}/5 from {} reviews", stats.average, stats.total));
        for review in recent {
            lines.push(format!("  {} {}", stars(review.rating), review.comment));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Add to cart: royshop cart add {} --color <colour> --size <size>",
        product.id
    ));
    lines.join("\n")
}

// =============================================================================
// Cart & Orders
// =============================================================================

pub fn cart<S: KeyValueStore>(cart: &Cart<S>) -> String {
    let mut lines = Vec::new();

    if cart.is_empty() {
        lines.push("Your cart is empty.".to_string());
        lines.push(BACK_TO_SHOP.to_string());
    } else {
        lines.push("Your cart:".to_string());
        for item in cart.items() {
            lines.push(format!(
                "  [{}] {} ({}, {}) x{} @ {} = {}",
                item.key.product_id,
                item.name,
                item.key.color,
                item.key.size,
                item.quantity,
                item.unit_price,
                item.line_total()
            ));
        }
        lines.push(format!(
            "Items: {}   Subtotal: {}",
            cart.total_item_count(),
            cart.total_price()
        ));
        lines.push("Delivery is added at checkout (see `royshop wilayas`).".to_string());
    }

    if let Some(e) = cart.last_persist_error() {
        lines.push(format!(
            "Warning: {e}. Changes are kept for this run only."
        ));
    }

    lines.join("\n")
}

fn order_summary(order: &Order, lines: &mut Vec<String>) {
    for item in &order.items {
        lines.push(format!(
            "  {} ({}, {}) x{}  {}",
            item.name,
            item.key.color,
            item.key.size,
            item.quantity,
            item.line_total()
        ));
    }
    lines.push(format!("Subtotal: {}", order.total_price));
    lines.push(format!("Delivery: {} ({})", order.shipping_cost, order.wilaya));
    lines.push(format!("Total:    {}", order.grand_total()));
}

pub fn order_confirmation(order: &Order) -> String {
    let mut lines = vec![
        format!("Thank you, {}! Your order has been placed.", order.customer_name),
        format!("Order number: {}", order.id),
        String::new(),
    ];
    order_summary(order, &mut lines);
    lines.push(String::new());
    lines.push(format!(
        "Pay {} in cash on delivery. We will call {} to confirm.",
        order.grand_total(),
        order.phone_number
    ));
    lines.push(format!("Track it with: royshop orders show {}", order.id));
    lines.join("\n")
}

pub fn order_detail(order: &Order) -> String {
    let mut lines = vec![format!("Order {}", order.id)];
    if let Some(created_at) = order.created_at {
        lines.push(format!("Placed:   {}", created_at.format("%Y-%m-%d %H:%M UTC")));
    }
    lines.push(format!("Status:   {} ({})", order.status, order.payment_status));
    lines.push(format!(
        "Deliver to {}, {}, {}, {}",
        order.customer_name, order.exact_address, order.baladiya, order.wilaya
    ));
    lines.push(String::new());
    order_summary(order, &mut lines);
    lines.join("\n")
}

pub fn wilayas() -> String {
    WILAYAS
        .iter()
        .map(|w| format!("{:>2}  {:<20} {}", w.code, w.name, w.shipping_cost()))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Reviews
// =============================================================================

pub fn reviews(stats: &ReviewStats, reviews: &[Review]) -> String {
    if stats.total == 0 {
        return "No reviews yet. Be the first: royshop reviews add <product-id> --rating 5 --comment \"...\""
            .to_string();
    }

    let mut lines = vec![format!(
        "{:.1} out of 5 ({} reviews)",
        stats.average, stats.total
    )];
    for rating in Rating::all().collect::<Vec<_>>().into_iter().rev() {
        let percent = stats.percent_for(rating);
        // Bar of up to 20 cells
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cells = (percent / 5.0).round() as usize;
        lines.push(format!(
            "  {} {:<20} {}",
            rating.stars(),
            "#".repeat(cells),
            stats.count_for(rating)
        ));
    }

    lines.push(String::new());
    for review in reviews {
        let author = review.user_name.as_deref().unwrap_or("Anonymous");
        let verified = if review.is_verified {
            " (verified purchase)"
        } else {
            ""
        };
        lines.push(format!("{} {author}{verified}", stars(review.rating)));
        lines.push(format!("  {}", review.comment));
    }
    lines.join("\n")
}

pub fn latest_reviews(reviews: &[LatestReview]) -> String {
    if reviews.is_empty() {
        return "No customer reviews yet.".to_string();
    }
    reviews
        .iter()
        .map(|r| {
            format!(
                "{} \"{}\"\n  {} on {}",
                stars(r.review.rating),
                r.review.comment,
                r.author(),
                r.product_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn order_reviews_submitted(drafts: &[OrderReviewDraft], count: usize) -> String {
    let mut lines = vec![format!("Thanks! {count} review(s) submitted.")];
    let skipped: Vec<&str> = drafts
        .iter()
        .filter(|d| !d.submitted)
        .map(|d| d.product_name.as_str())
        .collect();
    if !skipped.is_empty() {
        lines.push(format!("Not reviewed: {}", skipped.join(", ")));
    }
    lines.join("\n")
}

// =============================================================================
// Admin
// =============================================================================

pub fn dashboard(dashboard: &Dashboard) -> String {
    let mut lines = vec![
        format!("Total revenue:    {}", dashboard.revenue.total_income),
        format!(
            "Completed orders: {}",
            dashboard.revenue.total_orders_completed
        ),
        String::new(),
        "Daily sales:".to_string(),
    ];

    if dashboard.daily_sales.is_empty() {
        lines.push("  none yet".to_string());
    }
    for day in &dashboard.daily_sales {
        lines.push(format!(
            "  {}  {}  ({} orders)",
            day.sale_date, day.daily_income, day.orders_count
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Awaiting payment: {} orders, {}",
        dashboard.pending_orders.len(),
        dashboard.pending_total()
    ));
    for order in &dashboard.pending_orders {
        lines.push(format!(
            "  [{}] {}  {}  {}, {}  {} items  {}",
            order.id,
            order.customer_name,
            order.phone_number,
            order.baladiya,
            order.wilaya,
            order.item_count(),
            order.grand_total()
        ));
    }
    if !dashboard.pending_orders.is_empty() {
        lines.push("Confirm a payment: royshop admin --password <pw> confirm <order-id>".to_string());
    }
    lines.join("\n")
}

// =============================================================================
// Errors
// =============================================================================

fn configuration_diagnostic(error: &AppError, lines: &mut Vec<String>) {
    let variable = match error {
        AppError::Configuration(e) => Some(e.variable()),
        _ => None,
    };

    if variable.is_some_and(|v| v.starts_with("SUPABASE_")) {
        lines.push("The shop is not connected to its backend.".to_string());
        lines.push("Set these variables:".to_string());
        for (name, what) in BACKEND_VARS {
            lines.push(format!("  {name:<18} {what}"));
        }
        lines.push("Cart commands keep working without the backend.".to_string());
    }
    lines.push(
        "Put them in a .env file in the directory you run royshop from, \
         or set them in the hosting environment."
            .to_string(),
    );
}

/// The message shown when a command fails.
pub fn diagnostic(error: &AppError) -> String {
    let mut lines = Vec::new();

    match error {
        AppError::Checkout(fields) => {
            lines.push("Please fix the following:".to_string());
            for (field, message) in fields.iter() {
                lines.push(format!("  - {field}: {message}"));
            }
        }
        _ => lines.push(format!("Error: {error}")),
    }

    if error.kind() == ErrorKind::Configuration {
        configuration_diagnostic(error, &mut lines);
    } else {
        lines.push(error.hint().to_string());
    }

    lines.push(BACK_TO_SHOP.to_string());
    lines.join("\n")
}
