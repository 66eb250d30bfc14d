//! Coupons
//!
//! A coupon maps a code to a discount rule that only applies once the cart subtotal reaches a
//! minimum order value. Discounts are either a capped percentage of the subtotal or a flat
//! amount.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::pricing::{PricingError, display_amount, percent_of_minor};

pub mod applied;
pub mod book;

pub use applied::AppliedCoupon;
pub use book::CouponBook;

/// Reasons a coupon cannot be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CouponError {
    /// No rule exists for the code.
    #[error("Invalid coupon code")]
    UnknownCode(String),

    /// There is nothing in the cart to discount.
    #[error("Add items to your cart before applying a coupon")]
    EmptyCart,

    /// The subtotal is below the rule's minimum order value.
    #[error("Minimum order of {symbol}{minimum} required for {code}")]
    MinimumNotMet {
        /// Coupon code as stored in the rule table
        code: String,
        /// Minimum order value in major units
        minimum: Decimal,
        /// Currency symbol of the minimum
        symbol: &'static str,
    },

    /// The rule would not reduce this order at all.
    #[error("Coupon {0} does not reduce this order")]
    NoDiscount(String),

    /// The discount could not be calculated.
    #[error("Could not calculate discount for {code}: {reason}")]
    Calculation {
        /// Coupon code
        code: String,
        /// Underlying arithmetic failure
        reason: String,
    },

    /// Subtotal and rule use different currencies.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CouponDiscount<'a> {
    /// A percentage of the subtotal, never more than `cap`.
    PercentCapped {
        /// Share of the subtotal
        percent: Percentage,
        /// Largest discount granted
        cap: Money<'a, Currency>,
    },

    /// A fixed amount off.
    Flat(Money<'a, Currency>),
}

impl fmt::Display for CouponDiscount<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponDiscount::PercentCapped { percent, cap } => {
                let points = (*percent * Decimal::ONE_HUNDRED).normalize();

                write!(
                    f,
                    "{points}% off, up to {}{}",
                    cap.currency().symbol,
                    display_amount(cap)
                )
            }
            CouponDiscount::Flat(amount) => {
                write!(f, "{}{} off", amount.currency().symbol, display_amount(amount))
            }
        }
    }
}

/// A coupon rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon<'a> {
    code: String,
    minimum_order: Money<'a, Currency>,
    discount: CouponDiscount<'a>,
}

impl<'a> Coupon<'a> {
    /// Create a coupon; the code is normalised to upper case.
    pub fn new(
        code: &str,
        minimum_order: Money<'a, Currency>,
        discount: CouponDiscount<'a>,
    ) -> Self {
        Self {
            code: normalise_code(code),
            minimum_order,
            discount,
        }
    }

    /// Upper-case coupon code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Smallest subtotal the coupon applies to.
    pub fn minimum_order(&self) -> &Money<'a, Currency> {
        &self.minimum_order
    }

    /// Discount rule.
    pub fn discount(&self) -> &CouponDiscount<'a> {
        &self.discount
    }

    /// Discount granted on `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] if the minimum order is not met, the currencies differ or the
    /// rule yields no discount.
    pub fn discount_for(
        &self,
        subtotal: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, CouponError> {
        if subtotal.currency() != self.minimum_order.currency() {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.minimum_order.currency().iso_alpha_code,
                actual: subtotal.currency().iso_alpha_code,
            }
            .into());
        }

        if subtotal.to_minor_units() < self.minimum_order.to_minor_units() {
            return Err(CouponError::MinimumNotMet {
                code: self.code.clone(),
                minimum: display_amount(&self.minimum_order),
                symbol: self.minimum_order.currency().symbol,
            });
        }

        let minor = match self.discount {
            CouponDiscount::PercentCapped { percent, cap } => {
                percent_of_minor(&percent, subtotal.to_minor_units())
                    .map_err(|error| self.calculation_error(&error))?
                    .min(cap.to_minor_units())
            }
            CouponDiscount::Flat(amount) => amount.to_minor_units(),
        };

        if minor <= 0 {
            return Err(CouponError::NoDiscount(self.code.clone()));
        }

        Ok(Money::from_minor(minor, subtotal.currency()))
    }

    fn calculation_error(&self, error: &PricingError) -> CouponError {
        CouponError::Calculation {
            code: self.code.clone(),
            reason: error.to_string(),
        }
    }
}

/// Codes compare case-insensitively and ignore surrounding whitespace.
pub(crate) fn normalise_code(code: &str) -> String {
    code.trim().to_uppercase()
}
