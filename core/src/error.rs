// bazaar/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::model::ProductId;

#[derive(Debug, Error)]
pub enum BazaarError {
  /// A referenced order, line item or remote product does not exist.
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  /// A remote dependency call failed, timed out, or was rejected by an open breaker.
  #[error("Dependency '{dependency}' unavailable: {reason}")]
  Unavailable { dependency: String, reason: String },

  /// The operation violates a lifecycle invariant.
  #[error("Invalid state: {0}")]
  InvalidState(String),

  /// Reserved for collaborators (e.g. duplicate shop name). Never raised by the cart core itself.
  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Storage operation failed. Source: {source}")]
  Storage {
    #[source]
    source: AnyhowError,
  },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Internal error: {0}")]
  Internal(String),
}

impl BazaarError {
  pub fn order_not_found(order_id: impl ToString) -> Self {
    BazaarError::NotFound {
      entity: "Order",
      id: order_id.to_string(),
    }
  }

  pub fn line_item_not_found(item_id: impl ToString) -> Self {
    BazaarError::NotFound {
      entity: "Line item",
      id: item_id.to_string(),
    }
  }

  pub fn product_not_found(product_id: ProductId) -> Self {
    BazaarError::NotFound {
      entity: "Product",
      id: product_id.to_string(),
    }
  }

  pub fn storage(source: impl Into<AnyhowError>) -> Self {
    BazaarError::Storage { source: source.into() }
  }

  /// True for failures that say nothing about the input and may succeed later.
  pub fn is_transient(&self) -> bool {
    matches!(self, BazaarError::Unavailable { .. } | BazaarError::Storage { .. })
  }
}

// Storage backends report through anyhow; surface them as storage failures.
impl From<AnyhowError> for BazaarError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<BazaarError>() {
      Ok(inner) => inner,
      Err(err) => BazaarError::Storage { source: err },
    }
  }
}

pub type BazaarResult<T, E = BazaarError> = std::result::Result<T, E>;
