// order_service/src/models/line_item_row.rs

use bazaar::LineItem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct LineItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: i64,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub created_at: DateTime<Utc>,
}

pub const LINE_ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, unit_price, created_at";

impl From<LineItemRow> for LineItem {
  fn from(row: LineItemRow) -> Self {
    LineItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      product_name: row.product_name,
      quantity: row.quantity,
      unit_price: row.unit_price,
      created_at: row.created_at,
    }
  }
}
