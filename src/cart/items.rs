//! Cart Items

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    cart::CartError,
    pricing::{PricingError, line_total},
};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// Opaque dish identifier, unique within a cart.
    DishId
}

string_id! {
    /// Opaque restaurant identifier.
    RestaurantId
}

/// A dish as offered by a menu screen. Every field is optional here; [`NewDish::validate`]
/// decides whether it can go into a cart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDish<'a> {
    /// Dish identifier
    pub id: Option<DishId>,

    /// Display name
    pub dish_name: Option<String>,

    /// Price of a single portion
    pub unit_price: Option<Money<'a, Currency>>,

    /// Image URL
    pub dish_image: Option<String>,
}

impl<'a> NewDish<'a> {
    /// Convenience constructor with every field present.
    pub fn new(
        id: impl Into<String>,
        dish_name: impl Into<String>,
        unit_price: Money<'a, Currency>,
        dish_image: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(DishId::new(id)),
            dish_name: Some(dish_name.into()),
            unit_price: Some(unit_price),
            dish_image: Some(dish_image.into()),
        }
    }

    /// Turn the dish into a line item with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingField`] when a required field is absent or blank and
    /// [`CartError::NegativePrice`] for negative prices.
    pub fn validate(&self) -> Result<CartLineItem<'a>, CartError> {
        let id = self
            .id
            .as_ref()
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or(CartError::MissingField("id"))?;

        let dish_name = required_text(self.dish_name.as_deref(), "dish_name")?;
        let unit_price = self.unit_price.ok_or(CartError::MissingField("unit_price"))?;
        let dish_image = required_text(self.dish_image.as_deref(), "dish_image")?;

        if unit_price.to_minor_units() < 0 {
            return Err(CartError::NegativePrice(id.clone()));
        }

        Ok(CartLineItem {
            dish_id: id.clone(),
            dish_name: dish_name.to_string(),
            dish_image: dish_image.to_string(),
            unit_price,
            quantity: 1,
        })
    }
}

fn required_text<'s>(value: Option<&'s str>, field: &'static str) -> Result<&'s str, CartError> {
    value
        .filter(|text| !text.trim().is_empty())
        .ok_or(CartError::MissingField(field))
}

/// A dish in the cart with its quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem<'a> {
    pub(crate) dish_id: DishId,
    pub(crate) dish_name: String,
    pub(crate) dish_image: String,
    pub(crate) unit_price: Money<'a, Currency>,
    pub(crate) quantity: u32,
}

impl<'a> CartLineItem<'a> {
    /// Dish identifier.
    pub fn dish_id(&self) -> &DishId {
        &self.dish_id
    }

    /// Display name.
    pub fn dish_name(&self) -> &str {
        &self.dish_name
    }

    /// Image URL.
    pub fn dish_image(&self) -> &str {
        &self.dish_image
    }

    /// Price of one portion.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Number of portions, always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'a, Currency>, PricingError> {
        line_total(&self.unit_price, self.quantity)
    }
}
