//! RoyShop Core - Shared types library.
//!
//! This crate provides common types used across all RoyShop components:
//! - `storefront` - Cart container, remote data gateway, checkout and reviews
//! - `cli` - Terminal storefront that drives the library
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, phone numbers, ratings,
//!   statuses and the province shipping table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
