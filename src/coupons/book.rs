//! Coupon Book

use decimal_percentage::Percentage;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::debug;

use super::{Coupon, CouponDiscount, CouponError, normalise_code};

/// Immutable table of coupon rules keyed by upper-case code.
#[derive(Debug, Clone, Default)]
pub struct CouponBook<'a> {
    coupons: FxHashMap<String, Coupon<'a>>,
}

impl<'a> CouponBook<'a> {
    /// Build a book from a set of rules. Later rules replace earlier ones with the same code.
    pub fn new(coupons: impl IntoIterator<Item = Coupon<'a>>) -> Self {
        Self {
            coupons: coupons
                .into_iter()
                .map(|coupon| (coupon.code().to_string(), coupon))
                .collect(),
        }
    }

    /// The house coupons:
    ///
    /// | Code | Minimum | Discount |
    /// |---|---|---|
    /// | `SAVE10` | 100 | 10%, at most 50 |
    /// | `FLAT20` | 200 | 20 off |
    /// | `SPECIAL25` | 500 | 25%, at most 100 |
    pub fn standard(currency: &'static Currency) -> Self {
        let major = |units: i64| Money::from_minor(units * 100, currency);

        Self::new([
            Coupon::new(
                "SAVE10",
                major(100),
                CouponDiscount::PercentCapped {
                    percent: Percentage::from(0.1),
                    cap: major(50),
                },
            ),
            Coupon::new("FLAT20", major(200), CouponDiscount::Flat(major(20))),
            Coupon::new(
                "SPECIAL25",
                major(500),
                CouponDiscount::PercentCapped {
                    percent: Percentage::from(0.25),
                    cap: major(100),
                },
            ),
        ])
    }

    /// Look up a rule, ignoring case and surrounding whitespace.
    pub fn get(&self, code: &str) -> Option<&Coupon<'a>> {
        self.coupons.get(&normalise_code(code))
    }

    /// Discount `code` grants on `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::UnknownCode`] for codes missing from the book, or the rule's
    /// own validation error.
    pub fn apply(
        &self,
        code: &str,
        subtotal: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, CouponError> {
        let coupon = self
            .get(code)
            .ok_or_else(|| CouponError::UnknownCode(code.to_string()))?;

        let result = coupon.discount_for(subtotal);

        debug!(code = coupon.code(), subtotal = %subtotal, ok = result.is_ok(), "evaluated coupon");

        result
    }

    /// Rules ordered by code.
    pub fn coupons(&self) -> Vec<&Coupon<'a>> {
        let mut coupons: Vec<_> = self.coupons.values().collect();
        coupons.sort_by(|a, b| a.code().cmp(b.code()));
        coupons
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Whether the book has no rules.
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use super::*;

    fn inr(major: i64) -> Money<'static, Currency> {
        Money::from_minor(major * 100, INR)
    }

    #[test]
    fn save10_is_ten_percent() -> TestResult {
        let book = CouponBook::standard(INR);

        assert_eq!(book.apply("SAVE10", &inr(150))?, inr(15));

        Ok(())
    }

    #[test]
    fn save10_is_capped_at_fifty() -> TestResult {
        let book = CouponBook::standard(INR);

        assert_eq!(book.apply("SAVE10", &inr(1_000))?, inr(50));

        Ok(())
    }

    #[test]
    fn save10_requires_one_hundred() {
        let book = CouponBook::standard(INR);

        let message = book.apply("SAVE10", &inr(50)).map_err(|e| e.to_string());

        assert_eq!(
            message,
            Err("Minimum order of ₹100 required for SAVE10".to_string())
        );
    }

    #[test]
    fn flat20_and_special25() -> TestResult {
        let book = CouponBook::standard(INR);

        assert_eq!(book.apply("FLAT20", &inr(200))?, inr(20));
        assert_eq!(book.apply("SPECIAL25", &inr(600))?, inr(100));
        assert_eq!(book.apply("SPECIAL25", &inr(500))?, inr(100));

        let flat = book.apply("FLAT20", &inr(199)).map_err(|e| e.to_string());
        assert_eq!(
            flat,
            Err("Minimum order of ₹200 required for FLAT20".to_string())
        );

        Ok(())
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() -> TestResult {
        let book = CouponBook::standard(INR);

        assert_eq!(book.apply("  save10 ", &inr(150))?, inr(15));
        assert_eq!(book.apply("Flat20", &inr(300))?, inr(20));

        Ok(())
    }

    #[test]
    fn unknown_code_is_invalid() {
        let book = CouponBook::standard(INR);

        let result = book.apply("XYZ", &inr(500));

        assert_eq!(result, Err(CouponError::UnknownCode("XYZ".to_string())));
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("Invalid coupon code".to_string())
        );
    }

    #[test]
    fn coupons_are_sorted_by_code() {
        let book = CouponBook::standard(INR);
        let coupons = book.coupons();
        let codes: Vec<_> = coupons.iter().map(|c| c.code()).collect();

        assert_eq!(codes, ["FLAT20", "SAVE10", "SPECIAL25"]);
        assert_eq!(book.len(), 3);
        assert!(!book.is_empty());
    }

    #[test]
    fn later_rules_replace_earlier_ones() -> TestResult {
        let book = CouponBook::new([
            Coupon::new("DUP", inr(0), CouponDiscount::Flat(inr(5))),
            Coupon::new("dup", inr(0), CouponDiscount::Flat(inr(7))),
        ]);

        assert_eq!(book.len(), 1);
        assert_eq!(book.apply("DUP", &inr(10))?, inr(7));

        Ok(())
    }
}
