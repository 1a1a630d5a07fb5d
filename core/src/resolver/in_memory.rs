// bazaar/src/resolver/in_memory.rs

//! An in-process product catalog implementing `ProductResolver`, with knobs for
//! latency and transport failures. Used by tests, benchmarks and local demos.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use super::{ProductResolver, ResolveError};
use crate::model::{ProductId, ProductSnapshot, ProductStatus};

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
  products: RwLock<HashMap<ProductId, ProductSnapshot>>,
  latency: Mutex<Option<Duration>>,
  failing: AtomicBool,
  calls: AtomicU64,
}

impl InMemoryCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds or replaces an ACTIVE product.
  pub fn insert(&self, id: ProductId, name: &str, unit_price: Decimal) {
    self.insert_snapshot(ProductSnapshot {
      id,
      unit_price,
      display_name: name.to_string(),
      availability: ProductStatus::Active,
    });
  }

  pub fn insert_snapshot(&self, snapshot: ProductSnapshot) {
    self.products.write().insert(snapshot.id, snapshot);
  }

  /// Changes the live price. Snapshots already taken are unaffected.
  pub fn set_price(&self, id: ProductId, unit_price: Decimal) {
    if let Some(product) = self.products.write().get_mut(&id) {
      product.unit_price = unit_price;
    }
  }

  pub fn set_status(&self, id: ProductId, status: ProductStatus) {
    if let Some(product) = self.products.write().get_mut(&id) {
      product.availability = status;
    }
  }

  pub fn remove(&self, id: ProductId) {
    self.products.write().remove(&id);
  }

  /// Every subsequent call sleeps this long before answering.
  pub fn set_latency(&self, latency: Option<Duration>) {
    *self.latency.lock() = latency;
  }

  /// While set, every call fails with a transport error.
  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  /// Number of resolve calls that reached the catalog.
  pub fn call_count(&self) -> u64 {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ProductResolver for InMemoryCatalog {
  async fn resolve(&self, product_id: ProductId) -> Result<ProductSnapshot, ResolveError> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    let latency = *self.latency.lock();
    if let Some(delay) = latency {
      tokio::time::sleep(delay).await;
    }

    if self.failing.load(Ordering::SeqCst) {
      return Err(ResolveError::transport(anyhow::anyhow!(
        "catalog connection refused while resolving product {}",
        product_id
      )));
    }

    self
      .products
      .read()
      .get(&product_id)
      .cloned()
      .ok_or(ResolveError::NotFound(product_id))
  }
}
