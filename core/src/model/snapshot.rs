// bazaar/src/model/snapshot.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ProductId;

/// Availability reported by the product service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
  Active,
  /// Any other remote status (moderation, blocked, archived, ...), kept verbatim.
  Other(String),
}

impl ProductStatus {
  pub fn from_remote(status: &str) -> Self {
    if status.eq_ignore_ascii_case("ACTIVE") {
      ProductStatus::Active
    } else {
      ProductStatus::Other(status.to_string())
    }
  }

  pub fn is_purchasable(&self) -> bool {
    matches!(self, ProductStatus::Active)
  }
}

impl fmt::Display for ProductStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProductStatus::Active => f.write_str("ACTIVE"),
      ProductStatus::Other(s) => f.write_str(s),
    }
  }
}

/// Immutable copy of a remote product, taken at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
  pub id: ProductId,
  pub unit_price: Decimal,
  pub display_name: String,
  pub availability: ProductStatus,
}
