//! Totals
//!
//! Pure calculation of the running cart totals. Every reducer transition
//! ends here, so the stored totals are always exactly this function of the
//! current lines and discount.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{cart::models::CartLine, config::PricingConfig};

/// Derived totals for a cart, all money in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line quantities.
    pub item_count: u32,

    /// Sum of unit price × quantity over all lines.
    pub subtotal: u64,

    /// Tax on the subtotal at the configured rate.
    pub tax: u64,

    /// Flat fee, zero for an empty cart.
    pub delivery_fee: u64,

    /// Session discount subtracted from the total.
    pub discount: u64,

    /// `subtotal + tax + delivery_fee − discount`, floored at zero.
    pub total: u64,
}

/// Calculate totals for the given lines and discount.
///
/// Pure and total over its inputs: no error path, identical inputs yield
/// identical outputs, and line order does not matter.
#[must_use]
pub fn calculate(lines: &[CartLine], discount: u64, config: &PricingConfig) -> CartTotals {
    let item_count = lines.iter().map(|line| line.quantity).sum();
    let subtotal = lines.iter().map(CartLine::line_total).sum();
    let tax = tax_on(subtotal, config.tax_rate);

    let delivery_fee = if item_count > 0 {
        config.delivery_fee
    } else {
        0
    };

    let total = subtotal
        .saturating_add(tax)
        .saturating_add(delivery_fee)
        .saturating_sub(discount);

    CartTotals {
        item_count,
        subtotal,
        tax,
        delivery_fee,
        discount,
        total,
    }
}

/// Tax in minor units on a minor-unit subtotal, rounded to the nearest unit.
fn tax_on(subtotal: u64, rate: Decimal) -> u64 {
    (Decimal::from(subtotal) * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_u64()
        .unwrap_or(0)
}
