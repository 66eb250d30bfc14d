//! Pricing
//!
//! Subtotals, surcharges and the final payable total of an order.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::config::PricingConfig;

/// Errors that can occur while pricing an order.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A charge that must be non-negative was negative (charge name).
    #[error("{0} cannot be negative")]
    NegativeCharge(&'static str),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Minor unit arithmetic overflowed.
    #[error("amount overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Charges added on top of the cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charges<'a> {
    /// Distance based delivery fee
    pub delivery: Money<'a, Currency>,

    /// Fixed platform fee
    pub platform_fee: Money<'a, Currency>,

    /// GST and restaurant charges
    pub taxes_and_charges: Money<'a, Currency>,

    /// Courier tip chosen by the customer
    pub tip: Money<'a, Currency>,
}

impl<'a> Charges<'a> {
    /// Derive charges from pricing config: the platform fee is fixed and the taxes are the
    /// configured GST share of the subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the GST cannot be represented in minor units.
    pub fn from_config(
        config: &PricingConfig<'a>,
        subtotal: Money<'a, Currency>,
        delivery: Money<'a, Currency>,
        tip: Money<'a, Currency>,
    ) -> Result<Self, PricingError> {
        let gst_minor = percent_of_minor(&config.gst, subtotal.to_minor_units())?;

        Ok(Self {
            delivery,
            platform_fee: config.platform_fee,
            taxes_and_charges: Money::from_minor(gst_minor, subtotal.currency()),
            tip,
        })
    }

    fn ensure_non_negative(&self) -> Result<(), PricingError> {
        let named = [
            ("delivery fee", &self.delivery),
            ("platform fee", &self.platform_fee),
            ("taxes and charges", &self.taxes_and_charges),
            ("tip", &self.tip),
        ];

        match named.iter().find(|(_, money)| money.to_minor_units() < 0) {
            Some((name, _)) => Err(PricingError::NegativeCharge(*name)),
            None => Ok(()),
        }
    }
}

/// Every component of an order's price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown<'a> {
    /// Sum of line totals
    pub subtotal: Money<'a, Currency>,

    /// Delivery fee
    pub delivery: Money<'a, Currency>,

    /// Platform fee
    pub platform_fee: Money<'a, Currency>,

    /// GST and charges
    pub taxes_and_charges: Money<'a, Currency>,

    /// Courier tip
    pub tip: Money<'a, Currency>,

    /// Coupon discount
    pub discount: Money<'a, Currency>,

    /// Amount payable
    pub total: Money<'a, Currency>,

    /// Whether the discount exceeded all charges and the total was floored at zero
    pub clamped: bool,
}

/// Price of `quantity` units at `unit_price`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the result does not fit in minor units.
pub fn line_total<'a>(
    unit_price: &Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, PricingError> {
    let minor = unit_price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, unit_price.currency()))
}

/// Compute the payable total:
/// `subtotal + delivery + platform fee + taxes + tip - discount`, floored at zero.
///
/// # Errors
///
/// Returns an error if a charge is negative or the amounts use different currencies.
pub fn compute_total<'a>(
    subtotal: Money<'a, Currency>,
    charges: &Charges<'a>,
    discount: Option<Money<'a, Currency>>,
) -> Result<PriceBreakdown<'a>, PricingError> {
    charges.ensure_non_negative()?;

    let zero = Money::from_minor(0, subtotal.currency());
    let discount = discount.unwrap_or(zero);

    if discount.to_minor_units() < 0 {
        return Err(PricingError::NegativeCharge("discount"));
    }

    let gross = [
        charges.delivery,
        charges.platform_fee,
        charges.taxes_and_charges,
        charges.tip,
    ]
    .into_iter()
    .try_fold(subtotal, |acc, charge| acc.add(charge))?;

    let net = gross.sub(discount)?;
    let clamped = net.to_minor_units() < 0;
    let total = if clamped { zero } else { net };

    Ok(PriceBreakdown {
        subtotal,
        delivery: charges.delivery,
        platform_fee: charges.platform_fee,
        taxes_and_charges: charges.taxes_and_charges,
        tip: charges.tip,
        discount,
        total,
        clamped,
    })
}

/// Calculate a percentage of a minor unit amount, rounded half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the result cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Amount in major units (e.g. rupees), keeping the currency's precision.
pub fn major_units(money: &Money<'_, Currency>) -> Decimal {
    Decimal::new(money.to_minor_units(), money.currency().exponent)
}

/// Amount in major units without a redundant fractional part: `100.00` becomes `100`,
/// `99.50` stays `99.50`.
pub fn display_amount(money: &Money<'_, Currency>) -> Decimal {
    let amount = major_units(money);

    if amount.fract().is_zero() {
        amount.trunc()
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, INR};
    use testresult::TestResult;

    use super::*;

    fn inr(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, INR)
    }

    fn charges(delivery: i64, platform: i64, taxes: i64, tip: i64) -> Charges<'static> {
        Charges {
            delivery: inr(delivery),
            platform_fee: inr(platform),
            taxes_and_charges: inr(taxes),
            tip: inr(tip),
        }
    }

    #[test]
    fn total_adds_every_charge() -> TestResult {
        let breakdown = compute_total(inr(30_000), &charges(2_000, 600, 2_803, 2_000), None)?;

        assert_eq!(breakdown.total, inr(37_403));
        assert_eq!(breakdown.discount, inr(0));
        assert!(!breakdown.clamped);

        Ok(())
    }

    #[test]
    fn total_subtracts_discount() -> TestResult {
        let breakdown =
            compute_total(inr(30_000), &charges(2_000, 600, 0, 0), Some(inr(3_000)))?;

        assert_eq!(breakdown.total, inr(29_600));

        Ok(())
    }

    #[test]
    fn total_is_floored_at_zero() -> TestResult {
        let breakdown = compute_total(inr(1_000), &charges(0, 0, 0, 0), Some(inr(2_000)))?;

        assert_eq!(breakdown.total, inr(0));
        assert!(breakdown.clamped);

        Ok(())
    }

    #[test]
    fn negative_tip_is_rejected() {
        let result = compute_total(inr(1_000), &charges(0, 0, 0, -1), None);

        assert_eq!(result, Err(PricingError::NegativeCharge("tip")));
    }

    #[test]
    fn currency_mismatch_is_reported() {
        let mut mixed = charges(100, 0, 0, 0);
        mixed.platform_fee = Money::from_minor(100, GBP);

        let result = compute_total(inr(1_000), &mixed, None);

        assert!(matches!(result, Err(PricingError::Money(_))));
    }

    #[test]
    fn line_total_multiplies_quantity() -> TestResult {
        assert_eq!(line_total(&inr(12_050), 3)?, inr(36_150));

        Ok(())
    }

    #[test]
    fn line_total_overflow() {
        let result = line_total(&inr(i64::MAX), 2);

        assert_eq!(result, Err(PricingError::Overflow));
    }

    #[test]
    fn gst_is_derived_from_subtotal() -> TestResult {
        let config = PricingConfig::default();
        let charges = Charges::from_config(&config, inr(56_060), inr(1_050), inr(0))?;

        // 5% of 560.60 = 28.03
        assert_eq!(charges.taxes_and_charges, inr(2_803));
        assert_eq!(charges.platform_fee, config.platform_fee);

        Ok(())
    }

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        assert_eq!(percent_of_minor(&Percentage::from(0.1), 15_005)?, 1_501);
        assert_eq!(percent_of_minor(&Percentage::from(0.25), 100_000)?, 25_000);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let result = percent_of_minor(&Percentage::from(2.0), i64::MAX);

        assert_eq!(result, Err(PricingError::PercentConversion));
    }

    #[test]
    fn display_amount_drops_zero_fraction() {
        assert_eq!(display_amount(&inr(10_000)).to_string(), "100");
        assert_eq!(display_amount(&inr(9_950)).to_string(), "99.50");
    }
}
