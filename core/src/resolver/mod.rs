// bazaar/src/resolver/mod.rs

//! Remote entity resolution: the contract for fetching a product snapshot from the
//! product-owning service. Implementations perform exactly one remote read per call
//! and cache nothing.

pub mod in_memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ProductId, ProductSnapshot};

pub use in_memory::InMemoryCatalog;

/// Raw outcome of a resolve call, before resilience handling.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// The remote service affirmatively reported that the product does not exist.
  #[error("Product {0} does not exist in the remote catalog")]
  NotFound(ProductId),

  /// The call did not complete: connect/read failure, 5xx, undecodable body.
  #[error("Transport failure. Source: {source}")]
  Transport {
    #[source]
    source: anyhow::Error,
  },
}

impl ResolveError {
  pub fn transport(source: impl Into<anyhow::Error>) -> Self {
    ResolveError::Transport { source: source.into() }
  }
}

/// Client for the product-owning service.
///
/// Base address and connection handling are the implementation's concern; service
/// discovery is injected by whoever constructs it.
#[async_trait]
pub trait ProductResolver: Send + Sync + 'static {
  async fn resolve(&self, product_id: ProductId) -> Result<ProductSnapshot, ResolveError>;
}
