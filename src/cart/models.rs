//! Cart Models

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    ids::Id,
    products::{ProductSnapshot, ProductUuid},
};

/// Marker for customer ids; the cart consumes no other identity data.
#[derive(Debug, Clone, Copy)]
pub struct Customer;

/// Customer UUID
pub type CustomerUuid = Id<Customer>;

/// Cart Line UUID, assigned by the remote store.
pub type CartLineUuid = Id<CartLine>;

/// A quantity of one product held by one cart. At most one line exists per
/// product; adding the same product again grows the quantity instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Snapshot of the product being purchased.
    pub product: ProductSnapshot,

    /// Units of the product, clamped to `[1, stock limit]`.
    pub quantity: u32,

    /// When the product first entered the cart; preserved across quantity
    /// updates.
    pub added_at: Timestamp,

    /// True immediately for products without a prescription requirement,
    /// false until explicitly acknowledged otherwise.
    pub prescription_acknowledged: bool,

    /// Row id of the backing remote line; `None` for guest lines.
    #[serde(default)]
    pub remote_line: Option<CartLineUuid>,

    /// Server-side expiry of the backing remote line, when the store
    /// reports one.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

impl CartLine {
    /// A fresh line for `product`, not yet backed by a remote row.
    #[must_use]
    pub fn new(product: ProductSnapshot, quantity: u32, added_at: Timestamp) -> Self {
        let prescription_acknowledged = !product.requires_prescription;

        Self {
            product,
            quantity,
            added_at,
            prescription_acknowledged,
            remote_line: None,
            expires_at: None,
        }
    }

    /// Uuid of the product this line holds.
    #[must_use]
    pub fn product_uuid(&self) -> ProductUuid {
        self.product.uuid
    }

    /// Price of the line in minor units.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.product.price.saturating_mul(u64::from(self.quantity))
    }

    /// Whether the backing remote line expires within `window` of `now`.
    /// Always false for guest lines, which never expire client-side.
    #[must_use]
    pub fn expires_within(&self, now: Timestamp, window: SignedDuration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };

        now.checked_add(window)
            .is_ok_and(|cutoff| expires_at <= cutoff)
    }
}
