//! Products
//!
//! Read-only product snapshots as the catalog hands them to the cart. The
//! cart never mutates a snapshot; it only copies one into a line.

use serde::{Deserialize, Serialize};

use crate::ids::Id;

/// Fallback per-line quantity cap for products whose stock count is unknown.
pub const DEFAULT_STOCK_LIMIT: u32 = 99;

/// Product UUID
pub type ProductUuid = Id<ProductSnapshot>;

/// A catalog product as seen by the cart: effective price in minor currency
/// units, optional pre-discount price, and the stock / prescription flags
/// that gate cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product UUID
    pub uuid: ProductUuid,

    /// Display name
    pub name: String,

    /// Effective unit price in minor units; already discounted if a
    /// promotion applies.
    pub price: u64,

    /// Pre-discount unit price, when the product is on promotion.
    #[serde(default)]
    pub original_price: Option<u64>,

    /// Units the catalog reports in stock; `None` when it does not track a
    /// count for this product.
    #[serde(default)]
    pub stock_count: Option<u32>,

    /// Whether the product can be purchased at all.
    pub in_stock: bool,

    /// Whether a prescription must be acknowledged before checkout.
    pub requires_prescription: bool,
}

impl ProductSnapshot {
    /// Per-line quantity cap: the reported stock count, or
    /// [`DEFAULT_STOCK_LIMIT`] when the catalog reports none.
    #[must_use]
    pub fn stock_limit(&self) -> u32 {
        self.stock_count.unwrap_or(DEFAULT_STOCK_LIMIT)
    }

    /// Per-unit saving against the pre-discount price, when on promotion.
    #[must_use]
    pub fn saving(&self) -> Option<u64> {
        self.original_price
            .map(|original| original.saturating_sub(self.price))
    }
}
