//! Coupon Fixtures

use serde::Deserialize;

use crate::{
    coupons::{Coupon, CouponBook, CouponDiscount},
    fixtures::{
        FixtureError,
        pricing::{parse_currency, parse_money_in, parse_percentage},
    },
};

/// Wrapper for coupon rules in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// ISO currency code every amount must use
    pub currency: String,

    /// Coupon rules, later codes replace earlier duplicates
    pub coupons: Vec<CouponFixture>,
}

/// Coupon rule from YAML
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Coupon code, matched case-insensitively
    pub code: String,

    /// Smallest qualifying subtotal (e.g., "100 INR")
    pub minimum_order: String,

    /// Discount rule
    pub discount: DiscountFixture,
}

/// Discount rule from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountFixture {
    /// Percentage of the subtotal up to a cap
    PercentCapped {
        /// Share of the subtotal (e.g., "10%")
        percent: String,

        /// Largest discount (e.g., "50 INR")
        cap: String,
    },

    /// Fixed amount off (e.g., "20 INR")
    Flat {
        /// Amount string
        amount: String,
    },
}

impl TryFrom<CouponsFixture> for CouponBook<'_> {
    type Error = FixtureError;

    fn try_from(fixture: CouponsFixture) -> Result<Self, Self::Error> {
        let currency = parse_currency(&fixture.currency)?;

        let coupons = fixture
            .coupons
            .into_iter()
            .map(|coupon| {
                if coupon.code.trim().is_empty() {
                    return Err(FixtureError::InvalidCoupon(
                        "coupon code must not be blank".to_string(),
                    ));
                }

                let discount = match coupon.discount {
                    DiscountFixture::PercentCapped { percent, cap } => {
                        CouponDiscount::PercentCapped {
                            percent: parse_percentage(&percent)?,
                            cap: parse_money_in(&cap, currency)?,
                        }
                    }
                    DiscountFixture::Flat { amount } => {
                        CouponDiscount::Flat(parse_money_in(&amount, currency)?)
                    }
                };

                let minimum_order = parse_money_in(&coupon.minimum_order, currency)?;

                Ok(Coupon::new(&coupon.code, minimum_order, discount))
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        Ok(CouponBook::new(coupons))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::INR};
    use testresult::TestResult;

    use super::*;

    const RULES: &str = r#"
currency: INR
coupons:
  - code: save10
    minimum_order: "100 INR"
    discount:
      type: percent_capped
      percent: "10%"
      cap: "50 INR"
  - code: FLAT20
    minimum_order: "200 INR"
    discount:
      type: flat
      amount: "20 INR"
"#;

    #[test]
    fn rules_become_a_coupon_book() -> TestResult {
        let fixture: CouponsFixture = serde_norway::from_str(RULES)?;
        let book = CouponBook::try_from(fixture)?;

        assert_eq!(book.len(), 2);
        assert_eq!(
            book.apply("SAVE10", &Money::from_minor(15_000, INR))?,
            Money::from_minor(1_500, INR)
        );
        assert_eq!(
            book.apply("flat20", &Money::from_minor(20_000, INR))?,
            Money::from_minor(2_000, INR)
        );

        Ok(())
    }

    #[test]
    fn foreign_amounts_are_rejected() -> TestResult {
        let fixture: CouponsFixture =
            serde_norway::from_str(&RULES.replace("\"20 INR\"", "\"20 GBP\""))?;

        assert!(matches!(
            CouponBook::try_from(fixture),
            Err(FixtureError::CurrencyMismatch(_, _))
        ));

        Ok(())
    }

    #[test]
    fn blank_codes_are_rejected() -> TestResult {
        let fixture: CouponsFixture =
            serde_norway::from_str(&RULES.replace("code: FLAT20", "code: \" \""))?;

        assert!(matches!(
            CouponBook::try_from(fixture),
            Err(FixtureError::InvalidCoupon(_))
        ));

        Ok(())
    }
}
