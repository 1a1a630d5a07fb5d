// bazaar/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BazaarError, BazaarResult};

/// Lifecycle of an order.
///
/// `Cart → Pending → Processing → Shipped → Delivered`, with `Canceled` reachable
/// from every non-terminal state. Only `Cart` accepts line item mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Cart,
  Pending,
  Processing,
  Shipped,
  Delivered,
  Canceled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Cart => "CART",
      OrderStatus::Pending => "PENDING",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Canceled => "CANCELED",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
  }

  pub fn can_transition_to(&self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    match (*self, next) {
      (Cart, Pending) | (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
      (from, Canceled) => !from.is_terminal(),
      _ => false,
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = BazaarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "CART" => Ok(OrderStatus::Cart),
      "PENDING" => Ok(OrderStatus::Pending),
      "PROCESSING" => Ok(OrderStatus::Processing),
      "SHIPPED" => Ok(OrderStatus::Shipped),
      "DELIVERED" => Ok(OrderStatus::Delivered),
      "CANCELED" | "CANCELLED" => Ok(OrderStatus::Canceled),
      other => Err(BazaarError::InvalidState(format!("Unknown order status '{}'", other))),
    }
  }
}

/// Order aggregate root. While `status == Cart` this is the user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  /// Always Σ(unit_price × quantity) over the order's line items.
  pub total_price: Decimal,
  pub delivery_address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// A fresh, empty cart for `user_id`.
  pub fn new_cart(user_id: Uuid) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      user_id,
      status: OrderStatus::Cart,
      total_price: Decimal::ZERO,
      delivery_address: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_cart(&self) -> bool {
    self.status == OrderStatus::Cart
  }

  pub fn touch(&mut self) {
    self.updated_at = Utc::now();
  }

  /// Moves the order to `next`, enforcing the lifecycle state machine.
  pub fn transition_to(&mut self, next: OrderStatus) -> BazaarResult<()> {
    if !self.status.can_transition_to(next) {
      return Err(BazaarError::InvalidState(format!(
        "Order {} cannot move from {} to {}",
        self.id, self.status, next
      )));
    }
    self.status = next;
    self.touch();
    Ok(())
  }
}
