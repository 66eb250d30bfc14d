//! Thali
//!
//! Thali is the pricing core of a food ordering app: a single-restaurant cart, coupon
//! validation, distance based delivery fees and the final price breakdown handed to checkout.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupons;
pub mod delivery;
pub mod fixtures;
pub mod geo;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod receipt;
pub mod session;
