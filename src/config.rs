//! Pricing configuration

use decimal_percentage::Percentage;
use rusty_money::{
    Money,
    iso::{self, Currency},
};

use crate::delivery::DeliveryFeeSchedule;

/// Fees and rates applied when pricing an order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingConfig<'a> {
    /// Currency every amount is expressed in
    pub currency: &'static Currency,

    /// Distance based delivery fees
    pub delivery: DeliveryFeeSchedule<'a>,

    /// Fixed platform fee added to every order
    pub platform_fee: Money<'a, Currency>,

    /// GST share of the subtotal charged as taxes and charges
    pub gst: Percentage,
}

impl Default for PricingConfig<'_> {
    fn default() -> Self {
        Self {
            currency: iso::INR,
            delivery: DeliveryFeeSchedule::default(),
            platform_fee: Money::from_minor(600, iso::INR),
            gst: Percentage::from(0.05),
        }
    }
}
