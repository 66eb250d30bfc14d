//! Fixtures
//!
//! YAML files describing pricing, coupon rules and scripted orders, laid out as
//! `<base>/pricing/<name>.yml`, `<base>/coupons/<name>.yml` and `<base>/orders/<name>.yml`.

use std::{fs, path::PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::PricingConfig,
    coupons::CouponBook,
    geo::GeoError,
    session::{OrderSession, SessionError},
};

pub mod coupons;
pub mod orders;
pub mod pricing;

pub use orders::OrderFixture;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// An amount that must not be negative was
    #[error("Amount must not be negative: {0}")]
    NegativeAmount(String),

    /// Delivery distance that is negative or not finite
    #[error("Invalid delivery distance: {0} km")]
    InvalidDistance(f64),

    /// Currency mismatch between fixture files
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Invalid coupon rule
    #[error("Invalid coupon rule: {0}")]
    InvalidCoupon(String),

    /// Invalid scripted order
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Invalid location
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// The session refused part of a scripted order
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Pricing configuration, defaults until one is loaded
    pricing: PricingConfig<'a>,

    /// Coupon rules, the standard set until one is loaded
    coupons: Option<CouponBook<'a>>,
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Fixture<'a> {
    /// Create a new fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            pricing: PricingConfig::default(),
            coupons: None,
        }
    }

    fn read<T: DeserializeOwned>(&self, kind: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    /// Load the pricing configuration from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its amounts are
    /// malformed or in mixed currencies.
    pub fn load_pricing(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: pricing::PricingFixture = self.read("pricing", name)?;

        self.pricing = fixture.try_into()?;

        Ok(self)
    }

    /// Load coupon rules from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a rule is malformed, or if
    /// the rules use another currency than the pricing configuration.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: coupons::CouponsFixture = self.read("coupons", name)?;

        let currency = pricing::parse_currency(&fixture.currency)?;

        if currency != self.pricing.currency {
            return Err(FixtureError::CurrencyMismatch(
                self.pricing.currency.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            ));
        }

        self.coupons = Some(fixture.try_into()?);

        Ok(self)
    }

    /// Load a scripted order from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_order(&self, name: &str) -> Result<OrderFixture, FixtureError> {
        self.read("orders", name)
    }

    /// Pricing configuration.
    pub fn pricing(&self) -> &PricingConfig<'a> {
        &self.pricing
    }

    /// Coupon rules, falling back to the standard set in the pricing currency.
    pub fn coupons(&self) -> CouponBook<'a> {
        self.coupons
            .clone()
            .unwrap_or_else(|| CouponBook::standard(self.pricing.currency))
    }

    /// Start an empty session with the loaded pricing and coupons.
    pub fn session(&self) -> OrderSession<'a> {
        OrderSession::new(self.pricing, self.coupons())
    }

    /// Start a session and replay the named order into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the order cannot be loaded or replayed.
    pub fn order_session(&self, name: &str) -> Result<OrderSession<'a>, FixtureError> {
        let order = self.load_order(name)?;
        let mut session = self.session();

        order.apply(&mut session)?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusty_money::{Money, iso::INR};
    use tempfile::TempDir;
    use testresult::TestResult;

    use super::*;

    fn write(dir: &TempDir, kind: &str, name: &str, contents: &str) -> TestResult {
        let path = dir.path().join(kind);
        fs::create_dir_all(&path)?;
        fs::write(path.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn defaults_without_files() {
        let fixture = Fixture::with_base_path("/nonexistent");

        assert_eq!(fixture.pricing(), &PricingConfig::default());
        assert_eq!(fixture.coupons().len(), 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut fixture = Fixture::with_base_path("/nonexistent");

        assert!(matches!(
            fixture.load_pricing("default"),
            Err(FixtureError::Io(_))
        ));
    }

    #[test]
    fn loads_pricing_and_coupons_from_disk() -> TestResult {
        let dir = TempDir::new()?;

        write(
            &dir,
            "pricing",
            "cheap",
            r#"
currency: INR
platform_fee: "2 INR"
gst: "0.18"
delivery:
  base_fee: "5 INR"
  per_km_rate: "5 INR"
  base_distance_km: 2.0
  fallback_fee: "15 INR"
"#,
        )?;
        write(
            &dir,
            "coupons",
            "welcome",
            r#"
currency: INR
coupons:
  - code: WELCOME
    minimum_order: "0 INR"
    discount:
      type: flat
      amount: "25 INR"
"#,
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_pricing("cheap")?.load_coupons("welcome")?;

        assert_eq!(fixture.pricing().platform_fee, Money::from_minor(200, INR));
        assert!((fixture.pricing().delivery.base_distance_km - 2.0).abs() < f64::EPSILON);
        assert_eq!(fixture.coupons().len(), 1);
        assert_eq!(
            fixture.session().delivery().fee,
            Money::from_minor(1_500, INR)
        );

        Ok(())
    }

    #[test]
    fn coupons_must_match_pricing_currency() -> TestResult {
        let dir = TempDir::new()?;

        write(&dir, "coupons", "pounds", "currency: GBP\ncoupons: []\n")?;

        let mut fixture = Fixture::with_base_path(dir.path());

        assert!(matches!(
            fixture.load_coupons("pounds"),
            Err(FixtureError::CurrencyMismatch(_, _))
        ));

        Ok(())
    }
}
