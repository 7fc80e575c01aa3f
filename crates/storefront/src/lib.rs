//! RoyShop storefront library.
//!
//! The client side of a small clothing shop: the persisted shopping cart,
//! the product catalog with its offline fallback, cash-on-delivery checkout,
//! product reviews and the sales dashboard. Front ends (see the `royshop`
//! CLI) build one [`state::AppState`] and drive everything through it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod reviews;
pub mod state;
pub mod storage;
