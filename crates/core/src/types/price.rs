//! Money helpers using decimal arithmetic.
//!
//! All amounts are [`Decimal`] values in the restaurant's single currency.
//! Stored and transmitted amounts are normalized with [`round_money`] so they
//! always carry exactly two decimal places (`"85.60"`, never `"85.6"`).

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for currency amounts.
pub const MONEY_SCALE: u32 = 2;

/// Currency symbol used when formatting amounts for display.
pub const CURRENCY_SYMBOL: &str = "$";

/// Round an amount to cents (midpoint away from zero) and fix its scale at 2.
///
/// ```
/// use rust_decimal::Decimal;
/// use tajine_house_core::round_money;
///
/// assert_eq!(round_money(Decimal::new(48195, 4)).to_string(), "4.82");
/// assert_eq!(round_money(Decimal::new(56, 1)).to_string(), "5.60");
/// ```
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Format an amount for display, e.g. `$85.60`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL}{}", round_money(amount))
}
