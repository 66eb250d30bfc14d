//! Pricing Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, INR, USD},
};
use serde::Deserialize;

use crate::{config::PricingConfig, delivery::DeliveryFeeSchedule, fixtures::FixtureError};

/// Pricing configuration in YAML
#[derive(Debug, Deserialize)]
pub struct PricingFixture {
    /// ISO currency code every price must use (e.g., "INR")
    pub currency: String,

    /// Platform fee (e.g., "6 INR")
    pub platform_fee: String,

    /// GST share of the subtotal (e.g., "5%")
    pub gst: String,

    /// Delivery fee schedule
    pub delivery: DeliveryFixture,
}

/// Delivery fee schedule in YAML
#[derive(Debug, Deserialize)]
pub struct DeliveryFixture {
    /// Fee up to `base_distance_km` (e.g., "10.50 INR")
    pub base_fee: String,

    /// Fee per started kilometre beyond the base distance
    pub per_km_rate: String,

    /// Distance covered by the base fee
    #[serde(default = "default_base_distance")]
    pub base_distance_km: f64,

    /// Fee charged when the distance is unknown
    pub fallback_fee: String,
}

fn default_base_distance() -> f64 {
    1.0
}

impl<'a> TryFrom<PricingFixture> for PricingConfig<'a> {
    type Error = FixtureError;

    fn try_from(fixture: PricingFixture) -> Result<Self, Self::Error> {
        let currency = parse_currency(&fixture.currency)?;
        let money = |s: &str| -> Result<Money<'a, Currency>, FixtureError> {
            let amount = parse_money_in(s, currency)?;

            if amount.to_minor_units() < 0 {
                return Err(FixtureError::NegativeAmount(s.to_string()));
            }

            Ok(amount)
        };

        let base_distance_km = fixture.delivery.base_distance_km;

        if !base_distance_km.is_finite() || base_distance_km < 0.0 {
            return Err(FixtureError::InvalidDistance(base_distance_km));
        }

        Ok(PricingConfig {
            currency,
            delivery: DeliveryFeeSchedule {
                base_fee: money(&fixture.delivery.base_fee)?,
                per_km_rate: money(&fixture.delivery.per_km_rate)?,
                base_distance_km,
                fallback_fee: money(&fixture.delivery.fallback_fee)?,
            },
            platform_fee: money(&fixture.platform_fee)?,
            gst: parse_percentage(&fixture.gst)?,
        })
    }
}

/// Look up a supported ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for codes other than INR, GBP, USD and EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code.trim() {
        "INR" => Ok(INR),
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "10.50 INR") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount is
/// not a decimal number or has more decimal places than the currency allows, or if the
/// currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = parse_currency(
        parts
            .get(1)
            .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?,
    )?;

    if amount.normalize().scale() > currency.exponent {
        return Err(FixtureError::InvalidPrice(format!(
            "{s} has more than {} decimal places",
            currency.exponent
        )));
    }

    let minor_units = amount
        .checked_mul(Decimal::from(10_i64.pow(currency.exponent)))
        .and_then(|value| value.to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Parse a price and check it is in `currency`.
///
/// # Errors
///
/// Returns an error if the price is malformed or in another currency.
pub fn parse_money_in<'a>(
    s: &str,
    currency: &'static Currency,
) -> Result<Money<'a, Currency>, FixtureError> {
    let (minor_units, found) = parse_price(s)?;

    if found != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            found.iso_alpha_code.to_string(),
        ));
    }

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse percentage string (e.g., "5%" or "0.05") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or is negative.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    let value = if let Some(percent_str) = trimmed.strip_suffix('%') {
        percent_str
            .trim()
            .parse::<f64>()
            .map(|value| value / 100.0)
    } else {
        trimmed.parse::<f64>()
    }
    .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

    if !value.is_finite() || value < 0.0 {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(value))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn prices_become_minor_units() -> TestResult {
        assert_eq!(parse_price("10.50 INR")?, (1_050, INR));
        assert_eq!(parse_price("6 INR")?, (600, INR));
        assert_eq!(parse_price("2.99 GBP")?, (299, GBP));

        Ok(())
    }

    #[test]
    fn malformed_prices_are_rejected() {
        assert!(matches!(parse_price("10.50"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("ten INR"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(
            parse_price("10 XYZ"),
            Err(FixtureError::UnknownCurrency(code)) if code == "XYZ"
        ));
    }

    #[test]
    fn sub_paise_precision_is_rejected() -> TestResult {
        assert_eq!(parse_price("10.500 INR")?, (1_050, INR));
        assert!(matches!(
            parse_price("10.555 INR"),
            Err(FixtureError::InvalidPrice(_))
        ));

        Ok(())
    }

    #[test]
    fn money_in_the_wrong_currency_is_rejected() {
        assert!(matches!(
            parse_money_in("1 GBP", INR),
            Err(FixtureError::CurrencyMismatch(expected, found)) if expected == "INR" && found == "GBP"
        ));
    }

    #[test]
    fn percentages_accept_both_notations() -> TestResult {
        assert_eq!(parse_percentage("5%")?, Percentage::from(0.05));
        assert_eq!(parse_percentage("0.05")?, Percentage::from(0.05));
        assert!(parse_percentage("-1%").is_err());
        assert!(parse_percentage("lots").is_err());

        Ok(())
    }

    #[test]
    fn fixture_converts_to_config() -> TestResult {
        let fixture: PricingFixture = serde_norway::from_str(
            r#"
currency: INR
platform_fee: "6 INR"
gst: "5%"
delivery:
  base_fee: "10.50 INR"
  per_km_rate: "7.50 INR"
  fallback_fee: "10.50 INR"
"#,
        )?;

        let config = PricingConfig::try_from(fixture)?;

        assert_eq!(config, PricingConfig::default());

        Ok(())
    }

    fn pricing_yaml(per_km_rate: &str, base_distance_km: &str) -> String {
        format!(
            r#"
currency: INR
platform_fee: "6 INR"
gst: "5%"
delivery:
  base_fee: "10.50 INR"
  per_km_rate: "{per_km_rate}"
  base_distance_km: {base_distance_km}
  fallback_fee: "10.50 INR"
"#
        )
    }

    #[test]
    fn negative_delivery_rate_is_rejected() -> TestResult {
        let fixture: PricingFixture = serde_norway::from_str(&pricing_yaml("-7.50 INR", "1.0"))?;

        assert!(matches!(
            PricingConfig::try_from(fixture),
            Err(FixtureError::NegativeAmount(amount)) if amount == "-7.50 INR"
        ));

        Ok(())
    }

    #[test]
    fn unusable_base_distance_is_rejected() -> TestResult {
        for distance in ["-1.0", ".nan", ".inf"] {
            let fixture: PricingFixture =
                serde_norway::from_str(&pricing_yaml("7.50 INR", distance))?;

            assert!(matches!(
                PricingConfig::try_from(fixture),
                Err(FixtureError::InvalidDistance(_))
            ));
        }

        Ok(())
    }
}
