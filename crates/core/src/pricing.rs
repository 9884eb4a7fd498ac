//! Delivery fee and minimum order policy.
//!
//! The restaurant charges a percentage of the subtotal for delivery and
//! refuses orders below a minimum subtotal. There is no separate tax line;
//! orders record a tax of zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_money;

/// Pricing parameters shared by the cart, the checkout and the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPolicy {
    /// Fraction of the subtotal charged as delivery fee (0.07 = 7%).
    pub delivery_fee_rate: Decimal,
    /// Smallest subtotal accepted at checkout.
    pub minimum_order: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            delivery_fee_rate: Decimal::new(7, 2),
            minimum_order: Decimal::from(80),
        }
    }
}

impl PricingPolicy {
    /// Create a policy from a fee rate and minimum order.
    #[must_use]
    pub const fn new(delivery_fee_rate: Decimal, minimum_order: Decimal) -> Self {
        Self {
            delivery_fee_rate,
            minimum_order,
        }
    }

    /// Delivery fee for a subtotal, rounded to cents.
    #[must_use]
    pub fn delivery_fee(&self, subtotal: Decimal) -> Decimal {
        round_money(subtotal * self.delivery_fee_rate)
    }

    /// Subtotal plus delivery fee.
    #[must_use]
    pub fn total(&self, subtotal: Decimal) -> Decimal {
        round_money(subtotal + self.delivery_fee(subtotal))
    }

    /// Whether the subtotal reaches the minimum order.
    #[must_use]
    pub fn meets_minimum_order(&self, subtotal: Decimal) -> bool {
        subtotal >= self.minimum_order
    }

    /// How much more the customer must add to reach the minimum (zero if met).
    #[must_use]
    pub fn minimum_order_shortfall(&self, subtotal: Decimal) -> Decimal {
        round_money((self.minimum_order - subtotal).max(Decimal::ZERO))
    }

    /// Compute every derived amount for a subtotal at once.
    #[must_use]
    pub fn totals(&self, subtotal: Decimal) -> CartTotals {
        CartTotals {
            subtotal: round_money(subtotal),
            delivery_fee: self.delivery_fee(subtotal),
            tax: round_money(Decimal::ZERO),
            total: self.total(subtotal),
            minimum_order: round_money(self.minimum_order),
            shortfall: self.minimum_order_shortfall(subtotal),
        }
    }
}

/// Price of a line: unit price times quantity.
#[must_use]
pub fn line_total(price: Decimal, quantity: u32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Derived amounts for a cart or order, all rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub minimum_order: Decimal,
    /// Amount missing to reach the minimum order; zero when it is met.
    pub shortfall: Decimal,
}

impl CartTotals {
    /// Whether the subtotal reaches the minimum order.
    #[must_use]
    pub fn meets_minimum_order(&self) -> bool {
        self.shortfall.is_zero()
    }
}
