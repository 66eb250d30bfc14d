//! Checkout
//!
//! The flat record handed to the payment and order persistence collaborators once an order is
//! placed.

use jiff::Timestamp;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartLineItem, DishId, OrderInstructions, RestaurantId},
    pricing::{PriceBreakdown, major_units},
    session::SessionError,
};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Errors raised while placing an order.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// The order could not be priced.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Lifecycle state of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, waiting for the restaurant
    Pending,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLine {
    /// Dish identifier
    pub dish_id: DishId,

    /// Dish name
    pub dish_name: String,

    /// Dish image URL
    pub dish_image: String,

    /// Price of one portion in major units
    pub unit_price: Decimal,

    /// Number of portions
    pub quantity: u32,
}

impl From<&CartLineItem<'_>> for CheckoutLine {
    fn from(item: &CartLineItem<'_>) -> Self {
        Self {
            dish_id: item.dish_id().clone(),
            dish_name: item.dish_name().to_string(),
            dish_image: item.dish_image().to_string(),
            unit_price: major_units(item.unit_price()),
            quantity: item.quantity(),
        }
    }
}

/// Snapshot of a placed order. Amounts are in major units of `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRecord {
    /// Order identifier, e.g. `OP-LZ3K1Q2A-7F3QX`
    pub order_id: String,

    /// Order status
    pub status: OrderStatus,

    /// When the order was placed
    pub created_at: Timestamp,

    /// Restaurant the order goes to
    pub restaurant_id: Option<RestaurantId>,

    /// Ordered dishes
    pub items: Vec<CheckoutLine>,

    /// Kitchen and courier notes
    pub instructions: OrderInstructions,

    /// Active coupon code, if any
    pub coupon_code: Option<String>,

    /// ISO currency code
    pub currency: String,

    /// Sum of line totals
    pub subtotal: Decimal,

    /// Delivery fee
    pub delivery_fee: Decimal,

    /// Platform fee
    pub platform_fee: Decimal,

    /// GST and charges
    pub taxes_and_charges: Decimal,

    /// Courier tip
    pub tip: Decimal,

    /// Coupon discount
    pub discount: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Whether the discount exceeded the charges and `total` was floored at zero
    #[serde(default)]
    pub clamped: bool,
}

impl CheckoutRecord {
    /// Snapshot `cart` priced as `breakdown`.
    pub fn new(
        order_id: String,
        created_at: Timestamp,
        cart: &Cart<'_>,
        breakdown: &PriceBreakdown<'_>,
    ) -> Self {
        Self {
            order_id,
            status: OrderStatus::Pending,
            created_at,
            restaurant_id: cart.restaurant().cloned(),
            items: cart.items().iter().map(CheckoutLine::from).collect(),
            instructions: cart.instructions().clone(),
            coupon_code: cart
                .coupon()
                .filter(|coupon| coupon.is_applied())
                .map(|coupon| coupon.code().to_string()),
            currency: cart.currency().iso_alpha_code.to_string(),
            subtotal: major_units(&breakdown.subtotal),
            delivery_fee: major_units(&breakdown.delivery),
            platform_fee: major_units(&breakdown.platform_fee),
            taxes_and_charges: major_units(&breakdown.taxes_and_charges),
            tip: major_units(&breakdown.tip),
            discount: major_units(&breakdown.discount),
            total: major_units(&breakdown.total),
            clamped: breakdown.clamped,
        }
    }
}

/// Generate an order id: `OP-`, the timestamp in base 36 milliseconds, and five random base 36
/// characters, upper-cased.
pub fn generate_order_id<R: Rng + ?Sized>(now: Timestamp, rng: &mut R) -> String {
    let millis = u64::try_from(now.as_millisecond()).unwrap_or_default();

    let suffix: String = (0..5)
        .map(|_| base36_digit(rng.gen_range(0..36)))
        .collect();

    format!("OP-{}-{suffix}", to_base36(millis)).to_uppercase()
}

fn to_base36(mut value: u64) -> String {
    let mut digits = Vec::new();

    loop {
        digits.push(base36_digit(usize::try_from(value % 36).unwrap_or_default()));
        value /= 36;

        if value == 0 {
            break;
        }
    }

    digits.iter().rev().collect()
}

fn base36_digit(digit: usize) -> char {
    BASE36.get(digit).copied().map_or('0', char::from)
}
