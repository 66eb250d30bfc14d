//! Delivery
//!
//! Turns the distance between a restaurant and a customer into a delivery fee. The fee is a
//! flat base fee up to `base_distance_km`, plus `per_km_rate` for every started kilometre
//! beyond it.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::geo::{DistanceError, DistanceSource, GeoPoint};

/// Errors raised while computing a delivery fee.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeliveryError {
    /// Distance was negative or not finite.
    #[error("invalid delivery distance: {0} km")]
    InvalidDistance(f64),

    /// Fee does not fit in minor units.
    #[error("delivery fee overflowed")]
    Overflow,

    /// The schedule's base distance was negative or not finite.
    #[error("invalid base delivery distance: {0} km")]
    InvalidBaseDistance(f64),

    /// The schedule produced a fee below zero.
    #[error("delivery fee would be negative: {0} minor units")]
    NegativeFee(i64),

    /// Distance could not be determined.
    #[error(transparent)]
    Distance(#[from] DistanceError),
}

/// Delivery fee schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryFeeSchedule<'a> {
    /// Fee charged for any distance up to `base_distance_km`
    pub base_fee: Money<'a, Currency>,

    /// Fee for every started kilometre past `base_distance_km`
    pub per_km_rate: Money<'a, Currency>,

    /// Distance covered by the base fee
    pub base_distance_km: f64,

    /// Fee charged when no distance is available at all
    pub fallback_fee: Money<'a, Currency>,
}

impl Default for DeliveryFeeSchedule<'_> {
    fn default() -> Self {
        Self {
            base_fee: Money::from_minor(1_050, iso::INR),
            per_km_rate: Money::from_minor(750, iso::INR),
            base_distance_km: 1.0,
            fallback_fee: Money::from_minor(1_050, iso::INR),
        }
    }
}

impl<'a> DeliveryFeeSchedule<'a> {
    /// Fee for delivering over `distance_km`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::InvalidDistance`] for negative or non-finite distances,
    /// [`DeliveryError::InvalidBaseDistance`] or [`DeliveryError::NegativeFee`] for a
    /// schedule that cannot yield a valid fee, and [`DeliveryError::Overflow`] if the fee
    /// cannot be represented.
    pub fn fee_for_distance(&self, distance_km: f64) -> Result<Money<'a, Currency>, DeliveryError> {
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(DeliveryError::InvalidDistance(distance_km));
        }

        if !self.base_distance_km.is_finite() || self.base_distance_km < 0.0 {
            return Err(DeliveryError::InvalidBaseDistance(self.base_distance_km));
        }

        let minor = if distance_km <= self.base_distance_km {
            self.base_fee.to_minor_units()
        } else {
            let extra_km = Decimal::from_f64(distance_km - self.base_distance_km)
                .and_then(|extra| extra.ceil().to_i64())
                .ok_or(DeliveryError::Overflow)?;

            self.per_km_rate
                .to_minor_units()
                .checked_mul(extra_km)
                .and_then(|extra| extra.checked_add(self.base_fee.to_minor_units()))
                .ok_or(DeliveryError::Overflow)?
        };

        if minor < 0 {
            return Err(DeliveryError::NegativeFee(minor));
        }

        Ok(Money::from_minor(minor, self.base_fee.currency()))
    }

    /// Fallback fee, floored at zero.
    pub fn fallback_fee(&self) -> Money<'a, Currency> {
        if self.fallback_fee.to_minor_units() < 0 {
            Money::from_minor(0, self.fallback_fee.currency())
        } else {
            self.fallback_fee
        }
    }
}

/// Where a delivery quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    /// Computed from a fresh distance
    Computed,

    /// Last successfully computed fee, reused after a failure
    Cached,

    /// Configured fallback fee, no fee had been computed yet
    Fallback,
}

/// A delivery fee together with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryQuote<'a> {
    /// Fee to charge
    pub fee: Money<'a, Currency>,

    /// Distance the fee was computed from, if one was available
    pub distance_km: Option<f64>,

    /// Origin of the fee
    pub source: QuoteSource,
}

/// Quotes delivery fees, falling back to the last good fee (or the configured fallback)
/// when the distance source fails.
#[derive(Debug)]
pub struct DeliveryQuoter<'a, S: DistanceSource> {
    source: S,
    schedule: DeliveryFeeSchedule<'a>,
    last_quote: Option<DeliveryQuote<'a>>,
}

impl<'a, S: DistanceSource> DeliveryQuoter<'a, S> {
    /// Create a quoter using `source` for distances and `schedule` for fees.
    pub fn new(source: S, schedule: DeliveryFeeSchedule<'a>) -> Self {
        Self {
            source,
            schedule,
            last_quote: None,
        }
    }

    /// Fee schedule used by this quoter.
    pub fn schedule(&self) -> &DeliveryFeeSchedule<'a> {
        &self.schedule
    }

    /// Most recent successfully computed quote.
    pub fn last_quote(&self) -> Option<&DeliveryQuote<'a>> {
        self.last_quote.as_ref()
    }

    /// Compute the fee between two points without any fallback.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the distance or fee cannot be computed.
    pub fn try_quote(
        &self,
        from: GeoPoint,
        to: GeoPoint,
    ) -> Result<DeliveryQuote<'a>, DeliveryError> {
        let distance_km = self.source.distance_km(from, to)?;
        let fee = self.schedule.fee_for_distance(distance_km)?;

        Ok(DeliveryQuote {
            fee,
            distance_km: Some(distance_km),
            source: QuoteSource::Computed,
        })
    }

    /// Quote the fee between two points. Never fails: errors are logged and answered with
    /// the cached or fallback fee.
    pub fn quote(&mut self, from: GeoPoint, to: GeoPoint) -> DeliveryQuote<'a> {
        match self.try_quote(from, to) {
            Ok(quote) => {
                debug!(distance_km = ?quote.distance_km, fee = %quote.fee, "quoted delivery");
                self.last_quote = Some(quote);
                quote
            }
            Err(error) => {
                let quote = self.fallback();
                warn!(%error, fee = %quote.fee, source = ?quote.source, "delivery quote failed");
                quote
            }
        }
    }

    /// Quote used when no fresh distance is available.
    pub fn fallback(&self) -> DeliveryQuote<'a> {
        match self.last_quote {
            Some(last) => DeliveryQuote {
                source: QuoteSource::Cached,
                ..last
            },
            None => DeliveryQuote {
                fee: self.schedule.fallback_fee(),
                distance_km: None,
                source: QuoteSource::Fallback,
            },
        }
    }
}
