//! Applied Coupon

use rusty_money::{Money, iso::Currency};

use super::{CouponBook, CouponError};

/// Outcome of the last attempt to apply a coupon to a cart.
///
/// A successful attempt always carries a positive discount and a failed one always carries
/// the reason; the two never coexist.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedCoupon<'a> {
    /// The coupon is active.
    Applied {
        /// Upper-case coupon code
        code: String,
        /// Discount granted, always positive
        discount: Money<'a, Currency>,
    },

    /// The coupon was rejected.
    Rejected {
        /// Code as entered
        code: String,
        /// Why it was rejected
        error: CouponError,
    },
}

impl<'a> AppliedCoupon<'a> {
    /// Evaluate `code` against `subtotal`.
    pub fn evaluate(book: &CouponBook<'a>, code: &str, subtotal: &Money<'a, Currency>) -> Self {
        match book.apply(code, subtotal) {
            Ok(discount) => AppliedCoupon::Applied {
                code: book
                    .get(code)
                    .map_or_else(|| code.to_string(), |coupon| coupon.code().to_string()),
                discount,
            },
            Err(error) => AppliedCoupon::Rejected {
                code: code.to_string(),
                error,
            },
        }
    }

    /// Code the attempt was made with.
    pub fn code(&self) -> &str {
        match self {
            AppliedCoupon::Applied { code, .. } | AppliedCoupon::Rejected { code, .. } => code,
        }
    }

    /// Discount granted, if the coupon is active.
    pub fn discount(&self) -> Option<Money<'a, Currency>> {
        match self {
            AppliedCoupon::Applied { discount, .. } => Some(*discount),
            AppliedCoupon::Rejected { .. } => None,
        }
    }

    /// User facing rejection message, if the coupon was rejected.
    pub fn error_message(&self) -> Option<String> {
        match self {
            AppliedCoupon::Applied { .. } => None,
            AppliedCoupon::Rejected { error, .. } => Some(error.to_string()),
        }
    }

    /// Whether the coupon is active.
    pub fn is_applied(&self) -> bool {
        matches!(self, AppliedCoupon::Applied { .. })
    }
}
