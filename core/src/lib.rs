// bazaar/src/lib.rs

//! Bazaar: the cart and order core of a marketplace.
//!
//! - Each user has at most one CART order; line items snapshot the product's
//!   price and name when first added, and the order total is always recomputed
//!   from those snapshots with exact decimal arithmetic.
//! - Product data comes from a separate service through a `ProductResolver`,
//!   guarded by a hard timeout and a per-dependency circuit breaker. A failed or
//!   rejected lookup surfaces as `Unavailable`, never as made-up data.
//! - Every cart operation is a small step flow run under a per-user lock.
//!
//! Typical wiring:
//! 1. Build a `BreakerRegistry` once at startup.
//! 2. Wrap your product client in a `GuardedResolver`.
//! 3. Create a `CartController` over an `OrderStore` and the guarded resolver.
//! 4. Call its operations from your transport layer.

pub mod error;
pub mod flow;
pub mod lifecycle;
pub mod model;
pub mod pricing;
pub mod resilience;
pub mod resolver;
pub mod store;

pub use crate::error::{BazaarError, BazaarResult};
pub use crate::flow::{ContextData, Flow, FlowResult, StepControl};
pub use crate::lifecycle::CartController;
pub use crate::model::{LineItem, LineItemView, Order, OrderStatus, OrderView, ProductId, ProductSnapshot, ProductStatus};
pub use crate::resilience::{
  BreakerConfig, BreakerRegistry, BreakerSnapshot, CircuitBreaker, CircuitState, GuardedResolver, ResilienceConfig,
  PRODUCT_SERVICE,
};
pub use crate::resolver::{InMemoryCatalog, ProductResolver, ResolveError};
pub use crate::store::{CartChange, InMemoryOrderStore, OrderStore};
