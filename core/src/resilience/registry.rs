// bazaar/src/resilience/registry.rs

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
use super::config::BreakerConfig;

/// One breaker per named dependency, shared by every caller of that dependency.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
  default_config: BreakerConfig,
  breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
  pub fn new(default_config: BreakerConfig) -> Self {
    Self {
      default_config,
      breakers: RwLock::new(HashMap::new()),
    }
  }

  /// Returns the breaker for `name`, creating it with the default config on first use.
  pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
    if let Some(existing) = self.breakers.read().get(name) {
      return existing.clone();
    }
    let mut breakers = self.breakers.write();
    breakers
      .entry(name.to_string())
      .or_insert_with(|| {
        debug!(breaker = %name, "Registering circuit breaker with default config.");
        Arc::new(CircuitBreaker::new(name, self.default_config.clone()))
      })
      .clone()
  }

  /// Snapshots of all breakers, ordered by name.
  pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
    let mut snapshots: Vec<_> = self.breakers.read().values().map(|b| b.snapshot()).collect();
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    snapshots
  }

  pub fn all_closed(&self) -> bool {
    self
      .breakers
      .read()
      .values()
      .all(|b| b.state() == CircuitState::Closed)
  }
}
