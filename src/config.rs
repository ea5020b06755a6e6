//! Pricing configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Storefront-level pricing constants applied to every totals calculation.
///
/// Both values default to zero; the embedding storefront loads overrides
/// from its own configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tax rate applied to the subtotal, e.g. `0.20` for 20%.
    #[serde(default)]
    pub tax_rate: Decimal,

    /// Flat delivery fee in minor units, charged only on non-empty carts.
    #[serde(default)]
    pub delivery_fee: u64,
}
