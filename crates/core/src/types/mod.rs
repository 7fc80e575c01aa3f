//! Core types for RoyShop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;
pub mod price;
pub mod rating;
pub mod status;
pub mod wilaya;

pub use id::*;
pub use phone::{PhoneError, PhoneNumber};
pub use price::{Price, PriceError};
pub use rating::{Rating, RatingError};
pub use status::*;
pub use wilaya::{DEFAULT_WILAYA, WILAYAS, Wilaya};
