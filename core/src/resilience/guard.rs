// bazaar/src/resilience/guard.rs

//! Resilient product resolution: breaker gate, then a hard timeout, then the remote
//! call. Every failure path ends in `resolve_fallback`, which never invents data.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::breaker::CircuitBreaker;
use super::config::ResilienceConfig;
use super::registry::BreakerRegistry;
use crate::error::{BazaarError, BazaarResult};
use crate::model::{ProductId, ProductSnapshot};
use crate::resolver::{ProductResolver, ResolveError};

/// Why the guarded call did not produce a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackCause {
  #[error("circuit breaker is open")]
  CircuitOpen,
  #[error("call timed out after {0:?}")]
  TimedOut(Duration),
  #[error("transport failure: {0}")]
  Transport(String),
}

pub struct GuardedResolver {
  inner: Arc<dyn ProductResolver>,
  breaker: Arc<CircuitBreaker>,
  config: ResilienceConfig,
}

impl std::fmt::Debug for GuardedResolver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GuardedResolver")
      .field("dependency", &self.config.dependency)
      .field("call_timeout", &self.config.call_timeout)
      .field("breaker_state", &self.breaker.state())
      .finish()
  }
}

impl GuardedResolver {
  /// Wraps `inner` with the breaker registered under `config.dependency`.
  pub fn new(inner: Arc<dyn ProductResolver>, registry: &BreakerRegistry, config: ResilienceConfig) -> Self {
    let breaker = registry.breaker(&config.dependency);
    Self { inner, breaker, config }
  }

  pub fn breaker(&self) -> &Arc<CircuitBreaker> {
    &self.breaker
  }

  pub fn config(&self) -> &ResilienceConfig {
    &self.config
  }

  /// Exactly one remote read per call; no retries, no caching.
  ///
  /// A remote "not found" is a healthy answer and counts as a breaker success.
  #[instrument(name = "GuardedResolver::resolve", skip(self), fields(dependency = %self.config.dependency))]
  pub async fn resolve(&self, product_id: ProductId) -> BazaarResult<ProductSnapshot> {
    let permit = match self.breaker.try_acquire() {
      Ok(permit) => permit,
      Err(rejected) => {
        debug!(state = %rejected.state, "Breaker rejected product lookup.");
        return self.resolve_fallback(product_id, FallbackCause::CircuitOpen);
      }
    };

    match tokio::time::timeout(self.config.call_timeout, self.inner.resolve(product_id)).await {
      Ok(Ok(snapshot)) => {
        permit.success();
        Ok(snapshot)
      }
      Ok(Err(ResolveError::NotFound(id))) => {
        permit.success();
        Err(BazaarError::product_not_found(id))
      }
      Ok(Err(ResolveError::Transport { source })) => {
        let reason = format!("{:#}", source);
        permit.failure(&reason);
        self.resolve_fallback(product_id, FallbackCause::Transport(reason))
      }
      Err(_elapsed) => {
        let cause = FallbackCause::TimedOut(self.config.call_timeout);
        permit.failure(&cause.to_string());
        self.resolve_fallback(product_id, cause)
      }
    }
  }

  /// Fallback for a failed lookup. Always reports the dependency as unavailable.
  pub fn resolve_fallback(&self, product_id: ProductId, cause: FallbackCause) -> BazaarResult<ProductSnapshot> {
    warn!(
      dependency = %self.config.dependency,
      product_id,
      %cause,
      "Product lookup failed; reporting dependency unavailable."
    );
    Err(BazaarError::Unavailable {
      dependency: self.config.dependency.clone(),
      reason: format!("resolving product {}: {}", product_id, cause),
    })
  }
}
