//! Mortar prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        CartService, CartServiceError,
        guest::{GuestCartStore, GuestStoreError, JsonFileStore},
        models::{CartLine, CartLineUuid, Customer, CustomerUuid},
        reducer::{CartAction, CartState},
        remote::{RemoteCartLine, RemoteCartStore, RemoteStoreError, RestCartStore, RestConfig},
    },
    config::PricingConfig,
    ids::Id,
    notify::{CartNotifier, Notification, NotificationKind, TracingNotifier},
    products::{DEFAULT_STOCK_LIMIT, ProductSnapshot, ProductUuid},
    totals::{CartTotals, calculate},
};
