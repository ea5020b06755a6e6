//! End-to-end guest cart flows against the real file-backed store.

use std::sync::Arc;

use testresult::TestResult;
use uuid::Uuid;

use mortar::{
    cart::{CartService, remote::MockRemoteCartStore},
    config::PricingConfig,
    notify::TracingNotifier,
    prelude::{CartLine, GuestCartStore, JsonFileStore, ProductSnapshot},
};

fn product(name: &str, price: u64, stock_count: Option<u32>) -> ProductSnapshot {
    ProductSnapshot {
        uuid: Uuid::now_v7().into(),
        name: name.to_string(),
        price,
        original_price: None,
        stock_count,
        in_stock: true,
        requires_prescription: false,
    }
}

fn guest_service(dir: &std::path::Path) -> CartService {
    CartService::new(
        PricingConfig::default(),
        Arc::new(MockRemoteCartStore::new()),
        Arc::new(JsonFileStore::new(dir)),
        Arc::new(TracingNotifier),
        None,
    )
}

#[tokio::test]
async fn guest_shopping_flow_keeps_totals_consistent() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut cart = guest_service(dir.path());
    let paracetamol = product("Paracetamol 500mg", 2500, Some(10));

    cart.add_item(&paracetamol, 1).await?;
    assert_eq!(cart.totals().item_count, 1);
    assert_eq!(cart.totals().subtotal, 2500);

    cart.add_item(&paracetamol, 2).await?;
    assert_eq!(cart.state().lines().len(), 1);
    assert_eq!(cart.totals().item_count, 3);
    assert_eq!(cart.totals().subtotal, 7500);

    cart.update_quantity(paracetamol.uuid, 50).await?;
    assert_eq!(cart.totals().item_count, 10);

    cart.update_quantity(paracetamol.uuid, 3).await?;
    cart.apply_discount(1000);
    assert_eq!(cart.totals().subtotal, 7500);
    assert_eq!(cart.totals().total, 6500);

    cart.remove_item(paracetamol.uuid).await?;
    assert!(cart.state().lines().is_empty());
    assert_eq!(cart.totals().total, 0);
    assert_eq!(cart.totals().delivery_fee, 0);

    Ok(())
}

#[tokio::test]
async fn guest_cart_survives_a_restart() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ibuprofen = product("Ibuprofen 200mg", 1800, Some(30));
    let lozenges = product("Throat Lozenges", 600, None);

    let mut cart = guest_service(dir.path());
    cart.add_item(&ibuprofen, 2).await?;
    cart.add_item(&lozenges, 1).await?;

    let before: Vec<CartLine> = cart.state().lines().to_vec();

    let mut restarted = guest_service(dir.path());
    restarted.hydrate().await?;

    assert_eq!(restarted.state().lines().to_vec(), before);
    assert_eq!(restarted.totals().subtotal, 4200);

    Ok(())
}

#[tokio::test]
async fn clearing_a_guest_cart_drops_the_stored_copy() -> TestResult {
    let dir = tempfile::tempdir()?;
    let zinc = product("Zinc 25mg", 900, Some(15));

    let mut cart = guest_service(dir.path());
    cart.add_item(&zinc, 4).await?;
    cart.clear_cart().await?;

    assert!(cart.state().lines().is_empty());
    assert!(JsonFileStore::new(dir.path()).load()?.is_empty());

    Ok(())
}
