// bazaar/src/resilience/mod.rs

//! Timeout and circuit breaking around remote calls.

pub mod breaker;
pub mod config;
pub mod guard;
pub mod registry;

pub use breaker::{BreakerRejected, BreakerSnapshot, CallPermit, CircuitBreaker, CircuitState};
pub use config::{BreakerConfig, ResilienceConfig, PRODUCT_SERVICE};
pub use guard::{FallbackCause, GuardedResolver};
pub use registry::BreakerRegistry;
