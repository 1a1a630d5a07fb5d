// bazaar/src/model/view.rs

//! Read-side shapes returned to the transport layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{LineItem, Order, OrderStatus, ProductId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
  pub id: Uuid,
  pub product_id: ProductId,
  pub product_name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub subtotal: Decimal,
}

impl From<&LineItem> for LineItemView {
  fn from(item: &LineItem) -> Self {
    Self {
      id: item.id,
      product_id: item.product_id,
      product_name: item.product_name.clone(),
      unit_price: item.unit_price,
      quantity: item.quantity,
      // Stored items always fit: commits whose total overflows are rejected.
      subtotal: item.subtotal().unwrap_or(Decimal::MAX),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
  pub id: Uuid,
  pub user_id: Uuid,
  pub items: Vec<LineItemView>,
  pub total_price: Decimal,
  pub status: OrderStatus,
  pub delivery_address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderView {
  /// Items are listed oldest first so repeated reads render identically.
  pub fn from_parts(order: &Order, items: &[LineItem]) -> Self {
    let mut sorted: Vec<&LineItem> = items.iter().collect();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Self {
      id: order.id,
      user_id: order.user_id,
      items: sorted.into_iter().map(LineItemView::from).collect(),
      total_price: order.total_price,
      status: order.status,
      delivery_address: order.delivery_address.clone(),
      created_at: order.created_at,
      updated_at: order.updated_at,
    }
  }

  pub fn item_count(&self) -> usize {
    self.items.len()
  }
}
