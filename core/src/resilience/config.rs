// bazaar/src/resilience/config.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dependency name the product resolver's breaker is registered under.
pub const PRODUCT_SERVICE: &str = "product-service";

/// When a breaker opens and for how long it stays open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
  /// Percentage (0-100) of failed calls in the window that opens the breaker.
  pub failure_rate_threshold: u8,
  /// Calls that must be observed in the window before the rate is evaluated.
  pub minimum_calls: u32,
  /// Sliding observation window.
  pub window: Duration,
  /// How long the breaker stays open before admitting a half-open probe.
  pub open_duration: Duration,
}

impl Default for BreakerConfig {
  fn default() -> Self {
    Self {
      failure_rate_threshold: 50,
      minimum_calls: 5,
      window: Duration::from_secs(30),
      open_duration: Duration::from_secs(15),
    }
  }
}

impl BreakerConfig {
  /// True when `failures` out of `total` calls crosses the configured rate.
  pub fn is_tripped_by(&self, total: u64, failures: u64) -> bool {
    total > 0
      && total >= u64::from(self.minimum_calls)
      && failures * 100 >= total * u64::from(self.failure_rate_threshold)
  }
}

/// Per-call guard settings for one remote dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceConfig {
  pub dependency: String,
  /// Hard upper bound on a single remote call.
  pub call_timeout: Duration,
}

impl Default for ResilienceConfig {
  fn default() -> Self {
    Self {
      dependency: PRODUCT_SERVICE.to_string(),
      call_timeout: Duration::from_secs(2),
    }
  }
}
