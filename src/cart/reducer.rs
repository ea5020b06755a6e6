//! Cart Reducer
//!
//! Deterministic state machine over a single in-memory cart. Every
//! transition ends by recomputing the derived totals, so `totals` is never
//! anything but [`crate::totals::calculate`] of the current lines and
//! discount.

use std::collections::hash_map::Entry;

use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::{
    cart::models::CartLine,
    config::PricingConfig,
    products::{ProductSnapshot, ProductUuid},
    totals::{self, CartTotals},
};

/// A transition of the cart state machine.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Add `quantity` units of a product, merging into an existing line for
    /// the same product if one is present.
    AddLine {
        /// Product to add.
        product: ProductSnapshot,
        /// Units to add, clamped to the product's stock limit.
        quantity: u32,
    },

    /// Delete the line for a product; a no-op when absent.
    RemoveLine(ProductUuid),

    /// Set a line's quantity. Zero removes the line; anything else is
    /// clamped to `[1, stock limit]`. A no-op when the line is absent.
    SetQuantity {
        /// Product whose line to update.
        product: ProductUuid,
        /// Requested quantity.
        quantity: u32,
    },

    /// Empty the lines, leaving the discount and visibility flag alone.
    Clear,

    /// Flip the drawer visibility flag.
    ToggleOpen,

    /// Set the drawer visibility flag.
    SetOpen(bool),

    /// Set the session discount in minor units.
    ApplyDiscount(u64),

    /// Wholesale replace the lines; the rehydration path from either store.
    ReplaceLines(Vec<CartLine>),
}

/// The aggregate owned by the reducer: ordered lines (insertion order is
/// display order), the drawer flag, the session discount, and the derived
/// totals.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    lines: Vec<CartLine>,
    is_open: bool,
    discount: u64,
    totals: CartTotals,
}

impl CartState {
    /// An empty, closed cart with zero totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line holding `product`, if present.
    #[must_use]
    pub fn line(&self, product: ProductUuid) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.uuid == product)
    }

    /// Whether the cart drawer is visible.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Current session discount in minor units.
    #[must_use]
    pub fn discount(&self) -> u64 {
        self.discount
    }

    /// Derived totals for the current lines and discount.
    #[must_use]
    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    /// Whether any line still needs its prescription acknowledged before
    /// checkout.
    #[must_use]
    pub fn requires_acknowledgement(&self) -> bool {
        self.lines.iter().any(|line| !line.prescription_acknowledged)
    }

    /// Mark the prescription for `product` as acknowledged. Returns whether
    /// a line was updated. Does not affect totals.
    pub fn acknowledge_prescription(&mut self, product: ProductUuid) -> bool {
        match self
            .lines
            .iter_mut()
            .find(|line| line.product.uuid == product)
        {
            Some(line) => {
                line.prescription_acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Apply one action and recompute the totals.
    pub fn apply(&mut self, action: CartAction, config: &PricingConfig) {
        match action {
            CartAction::AddLine { product, quantity } => self.add_line(product, quantity),
            CartAction::RemoveLine(product) => self.remove_line(product),
            CartAction::SetQuantity { product, quantity } => self.set_quantity(product, quantity),
            CartAction::Clear => self.lines.clear(),
            CartAction::ToggleOpen => self.is_open = !self.is_open,
            CartAction::SetOpen(open) => self.is_open = open,
            CartAction::ApplyDiscount(amount) => self.discount = amount,
            CartAction::ReplaceLines(lines) => self.lines = fold_duplicates(lines),
        }

        self.totals = totals::calculate(&self.lines, self.discount, config);
    }

    fn add_line(&mut self, product: ProductSnapshot, quantity: u32) {
        let limit = product.stock_limit().max(1);

        match self
            .lines
            .iter_mut()
            .find(|line| line.product.uuid == product.uuid)
        {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity).min(limit);
            }
            None => {
                let quantity = quantity.clamp(1, limit);
                self.lines
                    .push(CartLine::new(product, quantity, Timestamp::now()));
            }
        }
    }

    fn remove_line(&mut self, product: ProductUuid) {
        self.lines.retain(|line| line.product.uuid != product);
    }

    fn set_quantity(&mut self, product: ProductUuid, quantity: u32) {
        if quantity == 0 {
            self.remove_line(product);
            return;
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product.uuid == product)
        {
            let limit = line.product.stock_limit().max(1);
            line.quantity = quantity.clamp(1, limit);
        }
    }
}

/// Fold an incoming line list so it holds at most one clamped line per
/// product, preserving first-seen order. Rehydrated data is not trusted to
/// uphold the invariant on its own.
fn fold_duplicates(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut by_product: FxHashMap<ProductUuid, usize> = FxHashMap::default();
    let mut folded: Vec<CartLine> = Vec::with_capacity(lines.len());

    for line in lines {
        let limit = line.product.stock_limit().max(1);

        match by_product.entry(line.product.uuid) {
            Entry::Occupied(slot) => {
                if let Some(existing) = folded.get_mut(*slot.get()) {
                    existing.quantity = existing.quantity.saturating_add(line.quantity).min(limit);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(folded.len());
                let mut line = line;
                line.quantity = line.quantity.clamp(1, limit);
                folded.push(line);
            }
        }
    }

    folded
}
