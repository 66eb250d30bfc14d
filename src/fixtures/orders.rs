//! Order Fixtures

use serde::Deserialize;

use crate::{
    cart::{DishId, NewDish, RestaurantId},
    fixtures::{FixtureError, pricing::parse_money_in},
    geo::{DistanceSource, GeoPoint},
    session::OrderSession,
};

/// A scripted order: which restaurant, what was added and what the customer chose at checkout.
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Restaurant the dishes come from
    pub restaurant: RestaurantFixture,

    /// Delivery location
    pub customer: GeoPoint,

    /// Dishes in the order they were added
    pub items: Vec<DishFixture>,

    /// Coupon code typed by the customer
    #[serde(default)]
    pub coupon: Option<String>,

    /// Tip (e.g., "20 INR")
    #[serde(default)]
    pub tip: Option<String>,

    /// Kitchen and courier notes
    #[serde(default)]
    pub instructions: InstructionsFixture,
}

/// Restaurant in YAML
#[derive(Debug, Deserialize)]
pub struct RestaurantFixture {
    /// Restaurant identifier
    pub id: String,

    /// Restaurant location
    pub location: GeoPoint,
}

/// Dish in YAML. Fields are optional so malformed menu entries can be scripted too.
#[derive(Debug, Deserialize)]
pub struct DishFixture {
    /// Dish identifier
    pub id: Option<String>,

    /// Dish name
    pub name: Option<String>,

    /// Unit price (e.g., "250 INR")
    pub price: Option<String>,

    /// Image URL
    pub image: Option<String>,

    /// Portions to add
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

/// Notes in YAML
#[derive(Debug, Deserialize)]
pub struct InstructionsFixture {
    /// Notes for the kitchen
    #[serde(default)]
    pub cooking: Option<String>,

    /// Notes for the courier
    #[serde(default)]
    pub delivery: Option<String>,

    /// Whether to pack cutlery
    #[serde(default = "yes")]
    pub send_cutlery: bool,
}

fn yes() -> bool {
    true
}

impl Default for InstructionsFixture {
    fn default() -> Self {
        Self {
            cooking: None,
            delivery: None,
            send_cutlery: true,
        }
    }
}

impl OrderFixture {
    /// Replay the order into `session`: locations, dishes, notes, tip and coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if a price is malformed, a location is invalid or the session rejects
    /// a dish.
    pub fn apply<S: DistanceSource>(
        &self,
        session: &mut OrderSession<'_, S>,
    ) -> Result<(), FixtureError> {
        let currency = session.config().currency;
        let restaurant = RestaurantId::new(self.restaurant.id.as_str());

        self.restaurant.location.validate()?;
        self.customer.validate()?;
        session.update_locations(self.customer, self.restaurant.location);

        for dish in &self.items {
            if dish.quantity == 0 {
                return Err(FixtureError::InvalidOrder(format!(
                    "dish {} has quantity 0",
                    dish.id.as_deref().unwrap_or("<unnamed>")
                )));
            }

            let new_dish = NewDish {
                id: dish.id.as_deref().map(DishId::from),
                dish_name: dish.name.clone(),
                unit_price: dish
                    .price
                    .as_deref()
                    .map(|price| parse_money_in(price, currency))
                    .transpose()?,
                dish_image: dish.image.clone(),
            };

            for _ in 0..dish.quantity {
                session.add_item(restaurant.clone(), &new_dish)?;
            }
        }

        session.set_instructions(
            self.instructions.cooking.clone(),
            self.instructions.delivery.clone(),
        );

        if !self.instructions.send_cutlery {
            session.toggle_cutlery();
        }

        if let Some(tip) = &self.tip {
            session.set_tip(parse_money_in(tip, currency)?)?;
        }

        if let Some(code) = &self.coupon {
            session.apply_coupon(code)?;
        }

        Ok(())
    }
}
