//! Cart
//!
//! The cart holds line items from a single restaurant. Every mutation either applies fully or
//! leaves the cart as it was.

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    coupons::{AppliedCoupon, CouponBook, CouponError},
    pricing::{Charges, PriceBreakdown, PricingError, compute_total},
};

pub mod instructions;
pub mod items;

pub use instructions::OrderInstructions;
pub use items::{CartLineItem, DishId, NewDish, RestaurantId};

/// Reasons a dish is refused by the cart.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CartError {
    /// A required field was absent or blank.
    #[error("dish is missing required field `{0}`")]
    MissingField(&'static str),

    /// The dish has a negative price.
    #[error("dish {0} has a negative price")]
    NegativePrice(DishId),

    /// The dish is priced in another currency than the cart.
    #[error("dish is priced in {actual}, but the cart uses {expected}")]
    CurrencyMismatch {
        /// Cart currency code
        expected: &'static str,
        /// Dish currency code
        actual: &'static str,
    },
}

/// A customer's cart.
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    currency: &'static Currency,
    restaurant: Option<RestaurantId>,
    items: SmallVec<[CartLineItem<'a>; 8]>,
    coupon: Option<AppliedCoupon<'a>>,
    instructions: OrderInstructions,
}

impl<'a> Cart<'a> {
    /// Create an empty cart priced in `currency`.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            restaurant: None,
            items: SmallVec::new(),
            coupon: None,
            instructions: OrderInstructions::default(),
        }
    }

    /// Cart currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Restaurant the items come from; `None` exactly when the cart is empty.
    pub fn restaurant(&self) -> Option<&RestaurantId> {
        self.restaurant.as_ref()
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[CartLineItem<'a>] {
        &self.items
    }

    /// Find the line item for a dish.
    pub fn get(&self, id: &DishId) -> Option<&CartLineItem<'a>> {
        self.items.iter().find(|item| &item.dish_id == id)
    }

    /// Quantity of a dish, zero when absent.
    pub fn quantity_of(&self, id: &DishId) -> u32 {
        self.get(id).map_or(0, CartLineItem::quantity)
    }

    /// Number of distinct dishes.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of portions.
    pub fn portions(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Coupon state from the last apply attempt.
    pub fn coupon(&self) -> Option<&AppliedCoupon<'a>> {
        self.coupon.as_ref()
    }

    /// Kitchen and courier notes.
    pub fn instructions(&self) -> &OrderInstructions {
        &self.instructions
    }

    /// Sum of unit price times quantity over all line items.
    ///
    /// # Errors
    ///
    /// Returns a `PricingError` if there was a money arithmetic or overflow error.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        self.items.iter().try_fold(
            Money::from_minor(0, self.currency),
            |acc, item| Ok(acc.add(item.line_total()?)?),
        )
    }

    /// Add one portion of `dish` from `restaurant`.
    ///
    /// Adding from another restaurant empties the cart first. Adding a dish that is already in
    /// the cart increments its quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] for malformed dishes; the cart is left untouched.
    pub fn add_item(
        &mut self,
        restaurant: RestaurantId,
        dish: &NewDish<'a>,
    ) -> Result<(), CartError> {
        let line = dish.validate().and_then(|line| self.ensure_currency(line));

        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!(%error, restaurant = %restaurant, "rejected dish");
                return Err(error);
            }
        };

        if self.restaurant.as_ref().is_some_and(|current| current != &restaurant)
            && !self.is_empty()
        {
            info!(
                from = ?self.restaurant,
                to = %restaurant,
                dropped = self.items.len(),
                "switching restaurant, clearing cart"
            );

            self.items.clear();
            self.coupon = None;
        }

        self.restaurant = Some(restaurant);

        match self.items.iter_mut().find(|item| item.dish_id == line.dish_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(line),
        }

        Ok(())
    }

    /// Add one portion of a dish already in the cart. Returns whether the dish was found.
    pub fn increment_quantity(&mut self, id: &DishId) -> bool {
        match self.items.iter_mut().find(|item| &item.dish_id == id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Remove one portion of a dish, dropping the line when it reaches zero. Returns whether
    /// the dish was found.
    pub fn decrement_quantity(&mut self, id: &DishId) -> bool {
        let Some(position) = self.position(id) else {
            return false;
        };

        let remaining = self.items.get_mut(position).map(|item| {
            item.quantity -= 1;
            item.quantity
        });

        if remaining == Some(0) {
            self.items.remove(position);
            self.forget_restaurant_if_empty();
        }

        true
    }

    /// Remove a dish entirely. Returns whether the dish was found.
    pub fn remove_item(&mut self, id: &DishId) -> bool {
        let Some(position) = self.position(id) else {
            return false;
        };

        self.items.remove(position);
        self.forget_restaurant_if_empty();

        true
    }

    /// Empty the cart and reset the coupon and instructions.
    pub fn clear(&mut self) {
        self.items.clear();
        self.restaurant = None;
        self.coupon = None;
        self.instructions = OrderInstructions::default();
    }

    /// Update kitchen and courier notes; `None` leaves a note unchanged.
    pub fn set_instructions(&mut self, cooking: Option<String>, delivery: Option<String>) {
        self.instructions.update(cooking, delivery);
    }

    /// Flip the cutlery preference.
    pub fn toggle_cutlery(&mut self) {
        self.instructions.toggle_cutlery();
    }

    /// Apply `code` against the current subtotal, replacing any previous coupon. An empty cart
    /// rejects every code.
    ///
    /// # Errors
    ///
    /// Returns a `PricingError` if the subtotal cannot be computed; coupon rejections are not
    /// errors and are recorded in the returned state instead.
    pub fn apply_coupon(
        &mut self,
        book: &CouponBook<'a>,
        code: &str,
    ) -> Result<&AppliedCoupon<'a>, PricingError> {
        let applied = if self.is_empty() {
            AppliedCoupon::Rejected {
                code: code.to_string(),
                error: CouponError::EmptyCart,
            }
        } else {
            AppliedCoupon::evaluate(book, code, &self.subtotal()?)
        };

        match &applied {
            AppliedCoupon::Applied { code, discount } => {
                info!(code = %code, discount = %discount, "applied coupon");
            }
            AppliedCoupon::Rejected { code, error } => {
                info!(code = %code, %error, "rejected coupon");
            }
        }

        Ok(self.coupon.insert(applied))
    }

    /// Re-evaluate the current coupon against the current subtotal. An empty cart drops the
    /// coupon altogether.
    ///
    /// # Errors
    ///
    /// Returns a `PricingError` if the subtotal cannot be computed.
    pub fn revalidate_coupon(&mut self, book: &CouponBook<'a>) -> Result<(), PricingError> {
        if self.is_empty() {
            self.coupon = None;
            return Ok(());
        }

        if let Some(code) = self.coupon.as_ref().map(|coupon| coupon.code().to_string()) {
            self.apply_coupon(book, &code)?;
        }

        Ok(())
    }

    /// Drop the coupon, clearing both discount and error.
    pub fn remove_coupon(&mut self) {
        self.coupon = None;
    }

    /// Price the cart with the given charges and the active coupon.
    ///
    /// # Errors
    ///
    /// Returns a `PricingError` for negative charges or money arithmetic errors.
    pub fn price(&self, charges: &Charges<'a>) -> Result<PriceBreakdown<'a>, PricingError> {
        let discount = self.coupon.as_ref().and_then(AppliedCoupon::discount);

        compute_total(self.subtotal()?, charges, discount)
    }

    fn position(&self, id: &DishId) -> Option<usize> {
        self.items.iter().position(|item| &item.dish_id == id)
    }

    fn forget_restaurant_if_empty(&mut self) {
        if self.items.is_empty() {
            self.restaurant = None;
        }
    }

    fn ensure_currency(&self, line: CartLineItem<'a>) -> Result<CartLineItem<'a>, CartError> {
        let actual = line.unit_price.currency();

        if actual == self.currency {
            Ok(line)
        } else {
            Err(CartError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code,
                actual: actual.iso_alpha_code,
            })
        }
    }
}
