//! Order Session
//!
//! The single owned state container for one customer's order: the cart, the coupon book loaded
//! for the session, the pricing config, the delivery quote and the tip. Screens hold a
//! reference to the session and mutate it only through these methods.

use jiff::Timestamp;
use rand::Rng;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::info;

use crate::{
    cart::{Cart, CartError, DishId, NewDish, RestaurantId},
    checkout::{CheckoutError, CheckoutRecord, generate_order_id},
    config::PricingConfig,
    coupons::{AppliedCoupon, CouponBook},
    delivery::{DeliveryQuote, DeliveryQuoter},
    geo::{DistanceSource, GeoPoint, GreatCircle},
    pricing::{Charges, PriceBreakdown, PricingError},
};

/// Errors surfaced by session operations.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// The cart refused a dish.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The order could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// One customer's order in progress.
#[derive(Debug)]
pub struct OrderSession<'a, S: DistanceSource = GreatCircle> {
    config: PricingConfig<'a>,
    coupons: CouponBook<'a>,
    cart: Cart<'a>,
    quoter: DeliveryQuoter<'a, S>,
    delivery: DeliveryQuote<'a>,
    tip: Money<'a, Currency>,
}

impl<'a> OrderSession<'a> {
    /// Create a session measuring straight-line delivery distances.
    pub fn new(config: PricingConfig<'a>, coupons: CouponBook<'a>) -> Self {
        Self::with_distance_source(config, coupons, GreatCircle)
    }
}

impl<'a, S: DistanceSource> OrderSession<'a, S> {
    /// Create a session using `source` for delivery distances.
    pub fn with_distance_source(
        config: PricingConfig<'a>,
        coupons: CouponBook<'a>,
        source: S,
    ) -> Self {
        let quoter = DeliveryQuoter::new(source, config.delivery);
        let delivery = quoter.fallback();

        Self {
            cart: Cart::new(config.currency),
            tip: Money::from_minor(0, config.currency),
            config,
            coupons,
            quoter,
            delivery,
        }
    }

    /// Current cart.
    pub fn cart(&self) -> &Cart<'a> {
        &self.cart
    }

    /// Pricing configuration.
    pub fn config(&self) -> &PricingConfig<'a> {
        &self.config
    }

    /// Coupon rules loaded for this session.
    pub fn coupons(&self) -> &CouponBook<'a> {
        &self.coupons
    }

    /// Delivery quote currently charged.
    pub fn delivery(&self) -> &DeliveryQuote<'a> {
        &self.delivery
    }

    /// Tip currently added.
    pub fn tip(&self) -> Money<'a, Currency> {
        self.tip
    }

    /// Add one portion of a dish.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the dish is malformed or the cart cannot be priced.
    pub fn add_item(
        &mut self,
        restaurant: RestaurantId,
        dish: &NewDish<'a>,
    ) -> Result<(), SessionError> {
        self.change_items(|cart| Ok(cart.add_item(restaurant, dish)?))
    }

    /// Add one portion of a dish already in the cart. Returns whether the dish was found.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the cart cannot be priced.
    pub fn increment_quantity(&mut self, id: &DishId) -> Result<bool, SessionError> {
        self.change_items(|cart| Ok(cart.increment_quantity(id)))
    }

    /// Remove one portion of a dish. Returns whether the dish was found.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the cart cannot be priced.
    pub fn decrement_quantity(&mut self, id: &DishId) -> Result<bool, SessionError> {
        self.change_items(|cart| Ok(cart.decrement_quantity(id)))
    }

    /// Remove a dish entirely. Returns whether the dish was found.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the cart cannot be priced.
    pub fn remove_item(&mut self, id: &DishId) -> Result<bool, SessionError> {
        self.change_items(|cart| Ok(cart.remove_item(id)))
    }

    /// Run an item change on a copy of the cart and keep it only if the coupon can be
    /// revalidated afterwards.
    fn change_items<T>(
        &mut self,
        change: impl FnOnce(&mut Cart<'a>) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut cart = self.cart.clone();
        let outcome = change(&mut cart)?;

        cart.revalidate_coupon(&self.coupons)?;
        self.cart = cart;

        Ok(outcome)
    }

    /// Empty the cart and reset the coupon, instructions and tip.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.tip = Money::from_minor(0, self.config.currency);
    }

    /// Update kitchen and courier notes; `None` leaves a note unchanged.
    pub fn set_instructions(&mut self, cooking: Option<String>, delivery: Option<String>) {
        self.cart.set_instructions(cooking, delivery);
    }

    /// Flip the cutlery preference.
    pub fn toggle_cutlery(&mut self) {
        self.cart.toggle_cutlery();
    }

    /// Apply a coupon code to the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the cart cannot be priced. Rejected codes are recorded in
    /// the returned state.
    pub fn apply_coupon(&mut self, code: &str) -> Result<&AppliedCoupon<'a>, SessionError> {
        Ok(self.cart.apply_coupon(&self.coupons, code)?)
    }

    /// Drop the coupon.
    pub fn remove_coupon(&mut self) {
        self.cart.remove_coupon();
    }

    /// Set the courier tip.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeCharge`] for negative tips and a money error for tips
    /// in another currency.
    pub fn set_tip(&mut self, tip: Money<'a, Currency>) -> Result<(), SessionError> {
        if tip.to_minor_units() < 0 {
            return Err(PricingError::NegativeCharge("tip").into());
        }

        if tip.currency() != self.config.currency {
            return Err(PricingError::Money(rusty_money::MoneyError::CurrencyMismatch {
                expected: self.config.currency.iso_alpha_code,
                actual: tip.currency().iso_alpha_code,
            })
            .into());
        }

        self.tip = tip;

        Ok(())
    }

    /// Refresh the delivery quote for new customer and restaurant locations. Falls back to
    /// the last good or configured fee when the distance cannot be determined.
    pub fn update_locations(
        &mut self,
        customer: GeoPoint,
        restaurant: GeoPoint,
    ) -> &DeliveryQuote<'a> {
        self.delivery = self.quoter.quote(restaurant, customer);

        &self.delivery
    }

    /// Price the order from in-memory state.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the order cannot be priced.
    pub fn breakdown(&self) -> Result<PriceBreakdown<'a>, SessionError> {
        let subtotal = self.cart.subtotal()?;
        let charges = Charges::from_config(&self.config, subtotal, self.delivery.fee, self.tip)?;

        Ok(self.cart.price(&charges)?)
    }

    /// Complete the order: snapshot it as a [`CheckoutRecord`] and clear the session.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart, or a pricing error.
    #[tracing::instrument(skip_all, fields(restaurant = ?self.cart.restaurant()))]
    pub fn checkout<R: Rng + ?Sized>(
        &mut self,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<CheckoutRecord, CheckoutError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let breakdown = self.breakdown()?;
        let order_id = generate_order_id(now, rng);
        let record = CheckoutRecord::new(order_id, now, &self.cart, &breakdown);

        info!(order_id = %record.order_id, total = %breakdown.total, "order placed");

        self.clear();

        Ok(record)
    }
}
