// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use bazaar::{
  BazaarError, BazaarResult, BreakerConfig, BreakerRegistry, CartChange, CartController, GuardedResolver,
  InMemoryCatalog, InMemoryOrderStore, LineItem, Order, OrderStore, ProductId, ResilienceConfig,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

// --- Catalog fixtures ---
pub const P1: ProductId = 1;
pub const P2: ProductId = 2;
pub const P3: ProductId = 3;
pub const UNKNOWN_PRODUCT: ProductId = 404;

pub fn dec(s: &str) -> Decimal {
  s.parse().unwrap()
}

pub fn seeded_catalog() -> Arc<InMemoryCatalog> {
  let catalog = Arc::new(InMemoryCatalog::new());
  catalog.insert(P1, "Walnut desk lamp", dec("150.00"));
  catalog.insert(P2, "Linen tote", dec("19.99"));
  catalog.insert(P3, "Beeswax candle", dec("0.333"));
  catalog
}

/// Breaker settings small enough for tests to trip quickly.
pub fn test_breaker_config() -> BreakerConfig {
  BreakerConfig {
    failure_rate_threshold: 50,
    minimum_calls: 3,
    window: Duration::from_secs(30),
    open_duration: Duration::from_secs(10),
  }
}

// --- Harness ---
pub struct Harness<S: OrderStore = InMemoryOrderStore> {
  pub store: Arc<S>,
  pub catalog: Arc<InMemoryCatalog>,
  pub registry: Arc<BreakerRegistry>,
  pub controller: Arc<CartController>,
}

pub fn harness() -> Harness {
  harness_with_store(Arc::new(InMemoryOrderStore::new()))
}

pub fn harness_with_store<S: OrderStore>(store: Arc<S>) -> Harness<S> {
  let catalog = seeded_catalog();
  let registry = Arc::new(BreakerRegistry::new(test_breaker_config()));
  let resolver = Arc::new(GuardedResolver::new(
    catalog.clone(),
    &registry,
    ResilienceConfig::default(),
  ));
  let controller = Arc::new(CartController::new(store.clone(), resolver));
  Harness {
    store,
    catalog,
    registry,
    controller,
  }
}

pub fn user() -> Uuid {
  Uuid::new_v4()
}

// --- Failure-injecting store ---

/// Forwards to an in-memory store but fails the named operations on demand.
#[derive(Debug, Default)]
pub struct FlakyStore {
  pub inner: InMemoryOrderStore,
  failing: Mutex<HashSet<&'static str>>,
}

impl FlakyStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail(&self, op: &'static str) {
    self.failing.lock().insert(op);
  }

  pub fn heal(&self, op: &'static str) {
    self.failing.lock().remove(op);
  }

  fn check(&self, op: &'static str) -> BazaarResult<()> {
    if self.failing.lock().contains(op) {
      return Err(BazaarError::storage(anyhow::anyhow!("injected failure in {}", op)));
    }
    Ok(())
  }
}

#[async_trait]
impl OrderStore for FlakyStore {
  async fn get_or_create_cart(&self, user_id: Uuid) -> BazaarResult<Order> {
    self.check("get_or_create_cart")?;
    self.inner.get_or_create_cart(user_id).await
  }

  async fn find_cart(&self, user_id: Uuid) -> BazaarResult<Option<Order>> {
    self.check("find_cart")?;
    self.inner.find_cart(user_id).await
  }

  async fn find_order(&self, order_id: Uuid) -> BazaarResult<Option<Order>> {
    self.check("find_order")?;
    self.inner.find_order(order_id).await
  }

  async fn list_orders(&self, user_id: Uuid) -> BazaarResult<Vec<Order>> {
    self.check("list_orders")?;
    self.inner.list_orders(user_id).await
  }

  async fn save_order(&self, order: &Order) -> BazaarResult<()> {
    self.check("save_order")?;
    self.inner.save_order(order).await
  }

  async fn checkout_order(&self, order: &Order) -> BazaarResult<Order> {
    self.check("checkout_order")?;
    self.inner.checkout_order(order).await
  }

  async fn find_line_item(&self, order_id: Uuid, product_id: ProductId) -> BazaarResult<Option<LineItem>> {
    self.check("find_line_item")?;
    self.inner.find_line_item(order_id, product_id).await
  }

  async fn get_line_item(&self, item_id: Uuid) -> BazaarResult<Option<LineItem>> {
    self.check("get_line_item")?;
    self.inner.get_line_item(item_id).await
  }

  async fn commit_cart(&self, cart: &Order, change: &CartChange) -> BazaarResult<()> {
    self.check("commit_cart")?;
    self.inner.commit_cart(cart, change).await
  }

  async fn list_line_items(&self, order_id: Uuid) -> BazaarResult<Vec<LineItem>> {
    self.check("list_line_items")?;
    self.inner.list_line_items(order_id).await
  }
}

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
