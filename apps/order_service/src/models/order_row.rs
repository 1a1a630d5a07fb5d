// order_service/src/models/order_row.rs

use bazaar::{BazaarError, Order, OrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// `orders` row. Status is stored as text so new states need no enum migration.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub status: String,
  pub total_price: Decimal,
  pub delivery_address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub const ORDER_COLUMNS: &str = "id, user_id, status, total_price, delivery_address, created_at, updated_at";

impl TryFrom<OrderRow> for Order {
  type Error = BazaarError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status = row.status.parse::<OrderStatus>().map_err(|_| {
      BazaarError::Internal(format!("Order {} has unknown stored status '{}'", row.id, row.status))
    })?;
    Ok(Order {
      id: row.id,
      user_id: row.user_id,
      status,
      total_price: row.total_price,
      delivery_address: row.delivery_address,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}
