//! Subcommand implementations.
//!
//! Each command takes the application state, performs one storefront
//! operation and returns the text to print. Commands are generic over the
//! gateway and store so they run unchanged against in-memory fakes.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod reviews;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use royshop_storefront::config::{ConfigError, StorefrontConfig};
    use royshop_storefront::gateway::MemoryGateway;
    use royshop_storefront::state::AppState;
    use royshop_storefront::storage::MemoryStore;

    pub type TestState = AppState<MemoryGateway, Arc<MemoryStore>>;

    fn config() -> StorefrontConfig {
        StorefrontConfig::from_lookup(&|key| match key {
            "ROYSHOP_ADMIN_PASSWORD" => Some("s3cret".to_string()),
            _ => None,
        })
        .unwrap_or_else(|e| panic!("test config: {e}"))
    }

    pub fn online() -> TestState {
        AppState::new(config(), Ok(MemoryGateway::new()), Arc::new(MemoryStore::new()))
    }

    pub fn offline() -> TestState {
        AppState::new(
            config(),
            Err(ConfigError::MissingEnvVar("SUPABASE_URL".to_string())),
            Arc::new(MemoryStore::new()),
        )
    }
}
