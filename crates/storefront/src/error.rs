//! Unified error handling with Sentry integration.
//!
//! Module errors convert into one [`AppError`]. Front ends call
//! [`AppError::report`] once at their error boundary: remote and local
//! storage failures are captured to Sentry, user mistakes are only logged.

use thiserror::Error;

use crate::admin::AdminError;
use crate::catalog::{CatalogError, OptionError};
use crate::checkout::{CheckoutError, FieldErrors};
use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::reviews::ReviewError;
use crate::storage::StorageError;

/// Error taxonomy shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input the user can correct.
    Validation,
    /// The hosted backend failed or rejected the request.
    Remote,
    /// Local durable storage failed.
    Persistence,
    /// Required settings are missing.
    Configuration,
    NotFound,
    /// Admin access was refused.
    Unauthorized,
    /// A defect in the shipped program or data.
    Internal,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// User-correctable input problem.
    #[error("{0}")]
    Validation(String),

    /// Checkout form problems, one message per field.
    #[error("{0}")]
    Checkout(FieldErrors),

    /// Hosted backend operation failed.
    #[error("Remote service error: {0}")]
    Remote(#[from] GatewayError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Persistence(#[from] StorageError),

    /// Bundled catalog could not be read.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Backend credentials or other settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Admin dashboard refused access.
    #[error("{0}")]
    Admin(AdminError),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(fields) => Self::Checkout(fields),
            CheckoutError::Remote(e) => Self::Remote(e),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Validation(message) => Self::Validation(message),
            ReviewError::Remote(e) => Self::Remote(e),
        }
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Remote(e) => Self::Remote(e),
            other => Self::Admin(other),
        }
    }
}

impl From<OptionError> for AppError {
    fn from(err: OptionError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl AppError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Checkout(_) => ErrorKind::Validation,
            Self::Remote(GatewayError::NotFound(_)) | Self::NotFound(_) => ErrorKind::NotFound,
            Self::Remote(_) => ErrorKind::Remote,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Catalog(_) => ErrorKind::Internal,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Admin(AdminError::NotConfigured) => ErrorKind::Configuration,
            Self::Admin(_) => ErrorKind::Unauthorized,
        }
    }

    /// A short suggestion of what to do next.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "Correct the highlighted fields and try again.",
            ErrorKind::Remote => {
                if matches!(self, Self::Remote(GatewayError::RateLimited(_))) {
                    "The shop is busy. Wait a moment, then retry."
                } else {
                    "Check your connection and retry. Your cart has been kept."
                }
            }
            ErrorKind::Persistence => {
                "Check that the data directory is writable (ROYSHOP_DATA_DIR)."
            }
            ErrorKind::Configuration => {
                "Add the missing variables to .env for local runs, or set them in the hosting environment."
            }
            ErrorKind::NotFound => "Run `royshop products list` to browse the shop.",
            ErrorKind::Unauthorized => "Check the admin password and retry.",
            ErrorKind::Internal => "This is a bug; it has been reported.",
        }
    }

    /// Log the error and, for failures outside the user's control, capture
    /// it to Sentry.
    pub fn report(&self) {
        match self.kind() {
            ErrorKind::Remote | ErrorKind::Persistence | ErrorKind::Internal => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Command failed"
                );
            }
            ErrorKind::Configuration => {
                tracing::warn!(error = %self, "Configuration incomplete");
            }
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Unauthorized => {
                tracing::info!(error = %self, "Command rejected");
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
