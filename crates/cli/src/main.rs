//! RoyShop CLI - the terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog (works offline with the bundled products)
//! royshop products list --limit 4
//! royshop products show 3
//!
//! # Fill the cart; it is saved under ROYSHOP_DATA_DIR between runs
//! royshop cart add 3 --color "Light Blue" --size M --quantity 2
//! royshop cart show
//!
//! # Cash-on-delivery checkout (needs SUPABASE_URL and SUPABASE_ANON_KEY)
//! royshop checkout --name "Amina Haddad" --phone 0771234567 \
//!     --wilaya Alger --municipality "Bab Ezzouar" --address "Cité 5 Juillet"
//!
//! # Sales dashboard (needs ROYSHOP_ADMIN_PASSWORD)
//! royshop admin --password "$PW" dashboard
//! ```
//!
//! # Commands
//!
//! - `products` - List and inspect products
//! - `cart` - Show and change the saved cart
//! - `checkout` - Place the cart as an order
//! - `wilayas` - Delivery costs per province
//! - `reviews` - Read and write product reviews
//! - `orders` - Look up a placed order
//! - `admin` - Revenue dashboard and payment confirmation

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use royshop_core::{OrderId, ProductId};
use royshop_storefront::config::StorefrontConfig;
use royshop_storefront::error::AppError;
use royshop_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

use commands::reviews::RatingArg;

#[derive(Parser)]
#[command(name = "royshop")]
#[command(author, version, about = "RoyShop terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place the cart as a cash-on-delivery order
    Checkout {
        /// Full name of the recipient
        #[arg(long)]
        name: String,

        /// Mobile number (05/06/07 followed by 8 digits)
        #[arg(long)]
        phone: String,

        /// Province name or code
        #[arg(long, default_value = royshop_core::DEFAULT_WILAYA)]
        wilaya: String,

        /// City or municipality
        #[arg(long)]
        municipality: String,

        /// Street address
        #[arg(long)]
        address: String,
    },
    /// List provinces and their delivery cost
    Wilayas,
    /// Read and write product reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewsAction,
    },
    /// Look up placed orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Sales dashboard
    Admin {
        /// Dashboard password, checked against ROYSHOP_ADMIN_PASSWORD
        #[arg(long)]
        password: String,

        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Show one product with its reviews summary
    Show { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product; colour and size default to the first option
    Add {
        id: String,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        size: Option<String>,

        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        id: String,

        #[arg(long)]
        color: String,

        #[arg(long)]
        size: String,
    },
    /// Set a line's quantity; 0 or less removes it
    Update {
        id: String,

        #[arg(long)]
        color: String,

        #[arg(long)]
        size: String,

        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum ReviewsAction {
    /// Reviews and rating summary for a product
    List { product_id: String },
    /// Review a product
    Add {
        product_id: String,

        /// Stars, 1 to 5
        #[arg(long)]
        rating: u8,

        #[arg(long)]
        comment: String,
    },
    /// Latest verified reviews across the shop
    Latest {
        #[arg(long, default_value_t = 6)]
        limit: usize,
    },
    /// Review the products of a delivered order
    Order {
        order_id: String,

        /// `<product-id>=<stars>:<comment>`, once per product
        #[arg(long = "rate", required = true)]
        rates: Vec<RatingArg>,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Show an order
    Show { id: String },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Revenue, daily sales and orders awaiting payment
    Dashboard,
    /// Mark an order as paid
    Confirm { order_id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Logs go to stderr so command output on stdout stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "royshop=warn,royshop_storefront=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", render::diagnostic(&AppError::from(e)));
            return ExitCode::from(2);
        }
    };

    // Sentry first, so the tracing layer has a client to feed
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli, config).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            e.report();
            eprintln!("{}", render::diagnostic(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<String, AppError> {
    // Provinces need neither storage nor the backend
    if matches!(cli.command, Commands::Wilayas) {
        return Ok(render::wilayas());
    }

    let mut state = AppState::from_config(config)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List { limit, offset } => {
                commands::products::list(&state, limit, offset).await
            }
            ProductsAction::Show { id } => {
                commands::products::show(&state, &ProductId::new(id)).await
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => Ok(commands::cart::show(&state)),
            CartAction::Add {
                id,
                color,
                size,
                quantity,
            } => {
                commands::cart::add(
                    &mut state,
                    &ProductId::new(id),
                    color.as_deref(),
                    size.as_deref(),
                    quantity,
                )
                .await
            }
            CartAction::Remove { id, color, size } => {
                commands::cart::remove(&mut state, id, color, size)
            }
            CartAction::Update {
                id,
                color,
                size,
                quantity,
            } => commands::cart::update(&mut state, id, color, size, quantity),
            CartAction::Clear => Ok(commands::cart::clear(&mut state)),
        },
        Commands::Checkout {
            name,
            phone,
            wilaya,
            municipality,
            address,
        } => {
            let form = royshop_storefront::checkout::CheckoutForm {
                customer_name: name,
                phone,
                wilaya,
                municipality,
                address,
            };
            commands::checkout::place(&mut state, &form, chrono::Utc::now()).await
        }
        Commands::Wilayas => Ok(render::wilayas()),
        Commands::Reviews { action } => match action {
            ReviewsAction::List { product_id } => {
                commands::reviews::list(&state, &ProductId::new(product_id)).await
            }
            ReviewsAction::Add {
                product_id,
                rating,
                comment,
            } => commands::reviews::add(&state, ProductId::new(product_id), rating, comment).await,
            ReviewsAction::Latest { limit } => commands::reviews::latest(&state, limit).await,
            ReviewsAction::Order { order_id, rates } => {
                commands::reviews::order(&state, &OrderId::new(order_id), rates).await
            }
        },
        Commands::Orders { action } => match action {
            OrdersAction::Show { id } => commands::orders::show(&state, &OrderId::new(id)).await,
        },
        Commands::Admin { password, action } => match action {
            AdminAction::Dashboard => commands::admin::dashboard(&state, &password).await,
            AdminAction::Confirm { order_id } => {
                commands::admin::confirm(&state, &password, &OrderId::new(order_id)).await
            }
        },
    }
}
