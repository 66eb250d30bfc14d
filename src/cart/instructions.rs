//! Order Instructions

use serde::{Deserialize, Serialize};

/// Notes for the kitchen and the courier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInstructions {
    /// Notes for the kitchen
    pub cooking_instructions: Option<String>,

    /// Notes for the courier
    pub delivery_instructions: Option<String>,

    /// Whether to pack cutlery
    pub send_cutlery: bool,
}

impl Default for OrderInstructions {
    fn default() -> Self {
        Self {
            cooking_instructions: None,
            delivery_instructions: None,
            send_cutlery: true,
        }
    }
}

impl OrderInstructions {
    /// Replace the fields that are `Some`, leaving the others untouched.
    pub fn update(&mut self, cooking: Option<String>, delivery: Option<String>) {
        if let Some(cooking) = cooking {
            self.cooking_instructions = Some(cooking);
        }

        if let Some(delivery) = delivery {
            self.delivery_instructions = Some(delivery);
        }
    }

    /// Flip the cutlery preference.
    pub fn toggle_cutlery(&mut self) {
        self.send_cutlery = !self.send_cutlery;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutlery_defaults_to_true() {
        assert!(OrderInstructions::default().send_cutlery);
    }

    #[test]
    fn update_is_partial() {
        let mut instructions = OrderInstructions::default();

        instructions.update(Some("less spicy".to_string()), None);
        instructions.update(None, Some("ring twice".to_string()));

        assert_eq!(instructions.cooking_instructions.as_deref(), Some("less spicy"));
        assert_eq!(instructions.delivery_instructions.as_deref(), Some("ring twice"));
    }

    #[test]
    fn toggle_flips_back_and_forth() {
        let mut instructions = OrderInstructions::default();

        instructions.toggle_cutlery();
        assert!(!instructions.send_cutlery);

        instructions.toggle_cutlery();
        assert!(instructions.send_cutlery);
    }
}
