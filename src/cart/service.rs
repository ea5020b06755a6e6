//! Cart service.
//!
//! The single façade the storefront talks to. Identity is injected and
//! changed only through [`CartService::sign_in`] / [`CartService::sign_out`];
//! its presence alone decides whether a mutation routes to the remote store
//! or to the local reducer plus guest storage. While a customer is signed
//! in, the reducer is a read-through cache of the remote table: every
//! confirmed remote change re-lists the table and replaces the local lines.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::{
    cart::{
        errors::CartServiceError,
        guest::GuestCartStore,
        models::{CartLine, CustomerUuid},
        reducer::{CartAction, CartState},
        remote::RemoteCartStore,
    },
    config::PricingConfig,
    notify::{CartNotifier, Notification},
    products::{ProductSnapshot, ProductUuid},
    totals::CartTotals,
};

/// Orchestrates one shopper's cart across the remote per-customer line
/// table and the guest-local store.
///
/// One instance owns one [`CartState`]; mutations take `&mut self`, so a
/// single owner cannot race itself. Two instances over the same remote cart
/// remain last-write-wins, and no retry or timeout policy is applied here.
pub struct CartService {
    config: PricingConfig,
    state: CartState,
    customer: Option<CustomerUuid>,
    remote: Arc<dyn RemoteCartStore>,
    guest: Arc<dyn GuestCartStore>,
    notifier: Arc<dyn CartNotifier>,
}

impl CartService {
    /// A new service with an empty cart. Call [`Self::hydrate`] to load
    /// whichever store the identity makes authoritative.
    #[must_use]
    pub fn new(
        config: PricingConfig,
        remote: Arc<dyn RemoteCartStore>,
        guest: Arc<dyn GuestCartStore>,
        notifier: Arc<dyn CartNotifier>,
        customer: Option<CustomerUuid>,
    ) -> Self {
        Self {
            config,
            state: CartState::new(),
            customer,
            remote,
            guest,
            notifier,
        }
    }

    /// The current cart state.
    #[must_use]
    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Derived totals for the current state.
    #[must_use]
    pub fn totals(&self) -> &CartTotals {
        self.state.totals()
    }

    /// The signed-in customer, if any.
    #[must_use]
    pub fn customer(&self) -> Option<CustomerUuid> {
        self.customer
    }

    /// Load the cart from whichever store the identity makes authoritative.
    ///
    /// A guest cart that cannot be deserialized is logged and treated as
    /// empty; startup never fails on bad local data.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote store cannot be listed.
    pub async fn hydrate(&mut self) -> Result<(), CartServiceError> {
        match self.customer {
            Some(customer) => self.refresh_from_remote(customer).await,
            None => {
                let lines = self.load_guest_lines();
                self.state
                    .apply(CartAction::ReplaceLines(lines), &self.config);

                Ok(())
            }
        }
    }

    /// Switch to a signed-in customer and load their remote cart.
    ///
    /// Guest lines are not merged into the remote cart; guest storage stays
    /// untouched and out of view until the next [`Self::sign_out`].
    ///
    /// # Errors
    ///
    /// Returns an error when the remote store cannot be listed.
    pub async fn sign_in(&mut self, customer: CustomerUuid) -> Result<(), CartServiceError> {
        self.customer = Some(customer);

        self.refresh_from_remote(customer).await
    }

    /// Drop the identity and re-read the guest cart from local storage.
    pub fn sign_out(&mut self) {
        self.customer = None;

        let lines = self.load_guest_lines();
        self.state
            .apply(CartAction::ReplaceLines(lines), &self.config);
    }

    /// Add `quantity` units of a product to the cart.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::OutOfStock`]: the product cannot be purchased;
    ///   rejected before any state change.
    /// - [`CartServiceError::Remote`] / [`CartServiceError::Guest`]: the
    ///   authoritative store failed; state keeps its prior value.
    pub async fn add_item(
        &mut self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        if !product.in_stock {
            let rejected = CartServiceError::OutOfStock {
                name: product.name.clone(),
            };
            self.notifier.notify(Notification::error(rejected.to_string()));

            return Err(rejected);
        }

        let outcome = match self.customer {
            Some(customer) => self.remote_add(customer, product.uuid, quantity).await,
            None => self.local_mutation(CartAction::AddLine {
                product: product.clone(),
                quantity,
            }),
        };

        self.finish(outcome, "Added to cart")
    }

    /// Remove the line holding `product`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the authoritative store fails; state keeps its
    /// prior value.
    pub async fn remove_item(&mut self, product: ProductUuid) -> Result<(), CartServiceError> {
        let outcome = match self.customer {
            Some(customer) => self.remote_remove(customer, product).await,
            None => self.local_mutation(CartAction::RemoveLine(product)),
        };

        self.finish(outcome, "Removed from cart")
    }

    /// Set the quantity of the line holding `product`. Zero removes the
    /// line; other values are clamped to the product's stock limit.
    ///
    /// # Errors
    ///
    /// Returns an error when the authoritative store fails; state keeps its
    /// prior value.
    pub async fn update_quantity(
        &mut self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        if quantity == 0 {
            return self.remove_item(product).await;
        }

        let outcome = match self.customer {
            Some(customer) => self.remote_update(customer, product, quantity).await,
            None => self.local_mutation(CartAction::SetQuantity { product, quantity }),
        };

        self.finish(outcome, "Cart updated")
    }

    /// Remove every line from the cart. The order-processing path calls
    /// this after a successful submission.
    ///
    /// # Errors
    ///
    /// Returns an error when the authoritative store fails; state keeps its
    /// prior value.
    pub async fn clear_cart(&mut self) -> Result<(), CartServiceError> {
        let outcome = match self.customer {
            Some(customer) => self.remote_clear(customer).await,
            None => self.local_clear(),
        };

        self.finish(outcome, "Cart cleared")
    }

    /// Flip the cart drawer. UI-only; never touches a store.
    pub fn toggle_cart(&mut self) {
        self.state.apply(CartAction::ToggleOpen, &self.config);
    }

    /// Show or hide the cart drawer. UI-only; never touches a store.
    pub fn set_cart_open(&mut self, open: bool) {
        self.state.apply(CartAction::SetOpen(open), &self.config);
    }

    /// Set the session discount. Session-only; not persisted to any store.
    pub fn apply_discount(&mut self, amount: u64) {
        self.state
            .apply(CartAction::ApplyDiscount(amount), &self.config);
    }

    async fn remote_add(
        &mut self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        self.remote
            .upsert_quantity(customer, product, quantity.max(1))
            .await?;

        self.refresh_from_remote(customer).await
    }

    async fn remote_remove(
        &mut self,
        customer: CustomerUuid,
        product: ProductUuid,
    ) -> Result<(), CartServiceError> {
        // The row id comes from the current remote-derived view.
        let Some(line) = self.state.line(product).and_then(|line| line.remote_line) else {
            return Ok(());
        };

        self.remote.delete_line(line).await?;

        self.refresh_from_remote(customer).await
    }

    async fn remote_update(
        &mut self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        let Some((line, limit)) = self.state.line(product).and_then(|line| {
            line.remote_line
                .map(|uuid| (uuid, line.product.stock_limit().max(1)))
        }) else {
            return Ok(());
        };

        self.remote
            .update_line_quantity(line, quantity.clamp(1, limit))
            .await?;

        self.refresh_from_remote(customer).await
    }

    async fn remote_clear(&mut self, customer: CustomerUuid) -> Result<(), CartServiceError> {
        self.remote.delete_all_for_customer(customer).await?;

        self.refresh_from_remote(customer).await
    }

    async fn refresh_from_remote(
        &mut self,
        customer: CustomerUuid,
    ) -> Result<(), CartServiceError> {
        let records = self.remote.list_lines(customer).await?;

        debug!(lines = records.len(), "cart refreshed from remote store");

        let lines: Vec<CartLine> = records.into_iter().map(CartLine::from).collect();
        self.state
            .apply(CartAction::ReplaceLines(lines), &self.config);

        Ok(())
    }

    /// Apply a local action to a copy, persist the copy's lines, then
    /// commit it, so a failed write leaves the prior state intact.
    fn local_mutation(&mut self, action: CartAction) -> Result<(), CartServiceError> {
        let mut next = self.state.clone();
        next.apply(action, &self.config);

        self.guest.save(next.lines())?;
        self.state = next;

        Ok(())
    }

    fn local_clear(&mut self) -> Result<(), CartServiceError> {
        let mut next = self.state.clone();
        next.apply(CartAction::Clear, &self.config);

        self.guest.clear()?;
        self.state = next;

        Ok(())
    }

    fn load_guest_lines(&self) -> Vec<CartLine> {
        match self.guest.load() {
            Ok(lines) => lines,
            Err(cause) => {
                warn!(%cause, "guest cart could not be read; starting empty");

                Vec::new()
            }
        }
    }

    /// Emit the single outcome notification for one mutation attempt.
    fn finish(
        &self,
        outcome: Result<(), CartServiceError>,
        success_message: &str,
    ) -> Result<(), CartServiceError> {
        match &outcome {
            Ok(()) => self.notifier.notify(Notification::success(success_message)),
            Err(cause) => {
                error!(%cause, "cart mutation failed");
                self.notifier
                    .notify(Notification::error("Could not update your cart"));
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use jiff::Timestamp;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        cart::{
            guest::{GuestStoreError, MockGuestCartStore},
            remote::{MockRemoteCartStore, RemoteCartLine, RemoteStoreError},
        },
        notify::{MockCartNotifier, NotificationKind},
    };

    use super::*;

    fn product(price: u64, stock_count: Option<u32>) -> ProductSnapshot {
        ProductSnapshot {
            uuid: Uuid::now_v7().into(),
            name: "Omeprazole 20mg".to_string(),
            price,
            original_price: None,
            stock_count,
            in_stock: true,
            requires_prescription: false,
        }
    }

    fn remote_record(product: &ProductSnapshot, quantity: u32) -> RemoteCartLine {
        RemoteCartLine {
            uuid: Uuid::now_v7().into(),
            product: product.clone(),
            quantity,
            created_at: Timestamp::UNIX_EPOCH,
            expires_at: None,
        }
    }

    /// Notifier expecting exactly `successes` + `errors` notifications.
    fn notifier(successes: usize, errors: usize) -> MockCartNotifier {
        let mut notifier = MockCartNotifier::new();

        notifier
            .expect_notify()
            .withf(|n| n.kind == NotificationKind::Success)
            .times(successes)
            .return_const(());
        notifier
            .expect_notify()
            .withf(|n| n.kind == NotificationKind::Error)
            .times(errors)
            .return_const(());

        notifier
    }

    fn service(
        remote: MockRemoteCartStore,
        guest: MockGuestCartStore,
        notifier: MockCartNotifier,
        customer: Option<CustomerUuid>,
    ) -> CartService {
        CartService::new(
            PricingConfig::default(),
            Arc::new(remote),
            Arc::new(guest),
            Arc::new(notifier),
            customer,
        )
    }

    #[tokio::test]
    async fn add_rejects_out_of_stock_products() {
        let mut product = product(2500, Some(10));
        product.in_stock = false;

        let mut cart = service(
            MockRemoteCartStore::new(),
            MockGuestCartStore::new(),
            notifier(0, 1),
            None,
        );

        let result = cart.add_item(&product, 1).await;

        assert!(
            matches!(result, Err(CartServiceError::OutOfStock { .. })),
            "expected OutOfStock, got {result:?}"
        );
        assert!(cart.state().lines().is_empty());
    }

    #[tokio::test]
    async fn guest_add_applies_and_persists() -> TestResult {
        let product = product(2500, Some(10));

        let mut guest = MockGuestCartStore::new();
        guest.expect_save().times(1).returning(|_| Ok(()));

        let mut cart = service(MockRemoteCartStore::new(), guest, notifier(1, 0), None);

        cart.add_item(&product, 1).await?;

        assert_eq!(cart.totals().item_count, 1);
        assert_eq!(cart.totals().subtotal, 2500);

        Ok(())
    }

    #[tokio::test]
    async fn guest_adds_merge_into_one_line() -> TestResult {
        let product = product(2500, Some(10));

        let mut guest = MockGuestCartStore::new();
        guest.expect_save().times(2).returning(|_| Ok(()));

        let mut cart = service(MockRemoteCartStore::new(), guest, notifier(2, 0), None);

        cart.add_item(&product, 1).await?;
        cart.add_item(&product, 2).await?;

        assert_eq!(cart.state().lines().len(), 1);
        assert_eq!(cart.totals().item_count, 3);
        assert_eq!(cart.totals().subtotal, 7500);

        Ok(())
    }

    #[tokio::test]
    async fn guest_save_failure_leaves_state_unchanged() {
        let product = product(2500, Some(10));

        let mut guest = MockGuestCartStore::new();
        guest.expect_save().times(1).returning(|_| {
            Err(GuestStoreError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });

        let mut cart = service(MockRemoteCartStore::new(), guest, notifier(0, 1), None);

        let result = cart.add_item(&product, 1).await;

        assert!(
            matches!(result, Err(CartServiceError::Guest(_))),
            "expected Guest error, got {result:?}"
        );
        assert!(cart.state().lines().is_empty());
    }

    #[tokio::test]
    async fn remote_add_upserts_then_refreshes() -> TestResult {
        let customer: CustomerUuid = Uuid::now_v7().into();
        let product = product(2500, Some(10));
        let product_uuid = product.uuid;
        let record = remote_record(&product, 2);
        let line_uuid = record.uuid;

        let mut remote = MockRemoteCartStore::new();
        remote
            .expect_upsert_quantity()
            .withf(move |c, p, q| *c == customer && *p == product_uuid && *q == 2)
            .times(1)
            .returning(|_, _, _| Ok(()));
        remote
            .expect_list_lines()
            .times(1)
            .returning(move |_| Ok(vec![record.clone()]));

        let mut cart = service(
            remote,
            MockGuestCartStore::new(),
            notifier(1, 0),
            Some(customer),
        );

        cart.add_item(&product, 2).await?;

        assert_eq!(cart.totals().item_count, 2);
        assert_eq!(
            cart.state().lines().first().and_then(|line| line.remote_line),
            Some(line_uuid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn remote_failure_leaves_state_unchanged() {
        let customer: CustomerUuid = Uuid::now_v7().into();
        let product = product(2500, Some(10));

        let mut remote = MockRemoteCartStore::new();
        remote.expect_upsert_quantity().times(1).returning(|_, _, _| {
            Err(RemoteStoreError::UnexpectedResponse(
                "status 503".to_string(),
            ))
        });

        let mut cart = service(
            remote,
            MockGuestCartStore::new(),
            notifier(0, 1),
            Some(customer),
        );

        let result = cart.add_item(&product, 1).await;

        assert!(
            matches!(result, Err(CartServiceError::Remote(_))),
            "expected Remote error, got {result:?}"
        );
        assert!(cart.state().lines().is_empty());
    }

    #[tokio::test]
    async fn update_to_zero_routes_to_removal() -> TestResult {
        let product = product(2500, Some(10));
        let uuid = product.uuid;

        let mut guest = MockGuestCartStore::new();
        guest.expect_save().times(2).returning(|_| Ok(()));

        let mut cart = service(MockRemoteCartStore::new(), guest, notifier(2, 0), None);

        cart.add_item(&product, 2).await?;
        cart.update_quantity(uuid, 0).await?;

        assert!(cart.state().lines().is_empty());
        assert_eq!(cart.totals(), &CartTotals::default());

        Ok(())
    }

    #[tokio::test]
    async fn remote_update_clamps_to_the_stock_limit() -> TestResult {
        let customer: CustomerUuid = Uuid::now_v7().into();
        let product = product(2500, Some(10));
        let record = remote_record(&product, 1);
        let line_uuid = record.uuid;
        let refreshed = remote_record(&product, 10);

        let mut remote = MockRemoteCartStore::new();
        remote
            .expect_list_lines()
            .times(1)
            .returning(move |_| Ok(vec![record.clone()]));
        remote
            .expect_update_line_quantity()
            .withf(move |line, quantity| *line == line_uuid && *quantity == 10)
            .times(1)
            .returning(|_, _| Ok(()));
        remote
            .expect_list_lines()
            .times(1)
            .returning(move |_| Ok(vec![refreshed.clone()]));

        let mut cart = service(
            remote,
            MockGuestCartStore::new(),
            notifier(1, 0),
            Some(customer),
        );

        cart.hydrate().await?;
        cart.update_quantity(product.uuid, 50).await?;

        assert_eq!(cart.totals().item_count, 10);

        Ok(())
    }

    #[tokio::test]
    async fn remote_removal_of_an_absent_line_is_a_no_op() -> TestResult {
        let customer: CustomerUuid = Uuid::now_v7().into();

        let mut cart = service(
            MockRemoteCartStore::new(),
            MockGuestCartStore::new(),
            notifier(1, 0),
            Some(customer),
        );

        cart.remove_item(Uuid::now_v7().into()).await?;

        Ok(())
    }

    #[tokio::test]
    async fn remote_clear_deletes_all_then_refreshes() -> TestResult {
        let customer: CustomerUuid = Uuid::now_v7().into();

        let mut remote = MockRemoteCartStore::new();
        remote
            .expect_delete_all_for_customer()
            .times(1)
            .returning(|_| Ok(()));
        remote.expect_list_lines().times(1).returning(|_| Ok(vec![]));

        let mut cart = service(
            remote,
            MockGuestCartStore::new(),
            notifier(1, 0),
            Some(customer),
        );

        cart.clear_cart().await?;

        assert!(cart.state().lines().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn sign_in_switches_the_view_without_merging() -> TestResult {
        let guest_product = product(2500, Some(10));
        let remote_product = product(1000, Some(10));
        let customer: CustomerUuid = Uuid::now_v7().into();
        let record = remote_record(&remote_product, 4);

        let mut guest = MockGuestCartStore::new();
        guest.expect_save().times(1).returning(|_| Ok(()));

        let mut remote = MockRemoteCartStore::new();
        remote
            .expect_list_lines()
            .times(1)
            .returning(move |_| Ok(vec![record.clone()]));

        let mut cart = service(remote, guest, notifier(1, 0), None);

        cart.add_item(&guest_product, 1).await?;
        cart.sign_in(customer).await?;

        assert_eq!(cart.customer(), Some(customer));
        assert_eq!(cart.state().lines().len(), 1);
        assert_eq!(
            cart.state().lines().first().map(CartLine::product_uuid),
            Some(remote_product.uuid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn sign_out_rehydrates_from_guest_storage() -> TestResult {
        let customer: CustomerUuid = Uuid::now_v7().into();
        let stored = CartLine::new(product(2500, Some(10)), 2, Timestamp::UNIX_EPOCH);
        let stored_for_load = stored.clone();

        let mut guest = MockGuestCartStore::new();
        guest
            .expect_load()
            .times(1)
            .returning(move || Ok(vec![stored_for_load.clone()]));

        let mut cart = service(
            MockRemoteCartStore::new(),
            guest,
            notifier(0, 0),
            Some(customer),
        );

        cart.sign_out();

        assert_eq!(cart.customer(), None);
        assert_eq!(cart.state().lines().to_vec(), vec![stored]);

        Ok(())
    }

    #[tokio::test]
    async fn malformed_guest_storage_hydrates_empty() -> TestResult {
        let mut guest = MockGuestCartStore::new();
        guest.expect_load().times(1).returning(|| {
            let malformed = serde_json::from_str::<Vec<CartLine>>("not a cart")
                .expect_err("sample payload should not parse");

            Err(GuestStoreError::Serialization(malformed))
        });

        let mut cart = service(MockRemoteCartStore::new(), guest, notifier(0, 0), None);

        cart.hydrate().await?;

        assert!(cart.state().lines().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn ui_actions_never_touch_a_store() {
        let mut cart = service(
            MockRemoteCartStore::new(),
            MockGuestCartStore::new(),
            notifier(0, 0),
            None,
        );

        cart.toggle_cart();
        cart.set_cart_open(true);
        cart.apply_discount(500);

        assert!(cart.state().is_open());
        assert_eq!(cart.state().discount(), 500);
    }
}
