//! Mortar
//!
//! Mortar is the cart reconciliation and order-pricing engine for a pharmacy storefront: one façade over a guest-local cart and a remote per-customer cart table, with deterministic totals on every mutation.

pub mod cart;
pub mod config;
pub mod ids;
pub mod notify;
pub mod prelude;
pub mod products;
pub mod totals;
