//! Thali prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLineItem, DishId, NewDish, OrderInstructions, RestaurantId},
    checkout::{CheckoutError, CheckoutLine, CheckoutRecord, OrderStatus, generate_order_id},
    config::PricingConfig,
    coupons::{AppliedCoupon, Coupon, CouponBook, CouponDiscount, CouponError},
    delivery::{DeliveryError, DeliveryFeeSchedule, DeliveryQuote, DeliveryQuoter, QuoteSource},
    fixtures::{Fixture, FixtureError, OrderFixture},
    geo::{DistanceError, DistanceSource, GeoError, GeoPoint, GreatCircle, distance_km},
    pricing::{Charges, PriceBreakdown, PricingError, compute_total},
    receipt::{Receipt, ReceiptError},
    session::{OrderSession, SessionError},
};
