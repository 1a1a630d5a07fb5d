// bazaar/src/model/line_item.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProductId, ProductSnapshot};

/// One product's quantity and price snapshot inside an order.
///
/// `unit_price` and `product_name` are captured when the product first enters the
/// cart and are never refreshed; only `quantity` changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: ProductId,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub created_at: DateTime<Utc>,
}

impl LineItem {
  pub fn from_snapshot(order_id: Uuid, snapshot: &ProductSnapshot, quantity: i32) -> Self {
    Self {
      id: Uuid::new_v4(),
      order_id,
      product_id: snapshot.id,
      product_name: snapshot.display_name.clone(),
      quantity,
      unit_price: snapshot.unit_price,
      created_at: Utc::now(),
    }
  }

  /// `unit_price × quantity`, or `None` if the product does not fit a `Decimal`.
  pub fn subtotal(&self) -> Option<Decimal> {
    self.unit_price.checked_mul(Decimal::from(self.quantity))
  }
}
