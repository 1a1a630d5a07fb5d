// order_service/src/db/pg_store.rs

//! `OrderStore` over PostgreSQL. The singleton-cart and one-item-per-product rules
//! are enforced by the schema's unique indexes; see `migrations/`.

use async_trait::async_trait;
use bazaar::{BazaarError, BazaarResult, CartChange, LineItem, Order, OrderStatus, OrderStore, ProductId};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::models::line_item_row::LINE_ITEM_COLUMNS;
use crate::models::order_row::ORDER_COLUMNS;
use crate::models::{LineItemRow, OrderRow};

#[derive(Debug, Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn select_cart(&self, user_id: Uuid) -> BazaarResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 AND status = 'CART'",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error("select_cart"))?;
    row.map(Order::try_from).transpose()
  }
}

fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> BazaarError {
  move |e| {
    error!(operation, error = %e, "Database operation failed.");
    BazaarError::storage(e)
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(skip(self), err)]
  async fn get_or_create_cart(&self, user_id: Uuid) -> BazaarResult<Order> {
    if let Some(cart) = self.select_cart(user_id).await? {
      return Ok(cart);
    }

    // A concurrent first touch may win the insert; the partial unique index turns
    // ours into a no-op and the re-read returns the winner's cart.
    let now = Utc::now();
    sqlx::query(
      "INSERT INTO orders (id, user_id, status, total_price, created_at, updated_at) \
       VALUES ($1, $2, 'CART', 0, $3, $3) \
       ON CONFLICT (user_id) WHERE status = 'CART' DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(now)
    .execute(&self.pool)
    .await
    .map_err(db_error("insert_cart"))?;

    self
      .select_cart(user_id)
      .await?
      .ok_or_else(|| BazaarError::Internal(format!("Cart for user {} vanished right after creation", user_id)))
  }

  async fn find_cart(&self, user_id: Uuid) -> BazaarResult<Option<Order>> {
    self.select_cart(user_id).await
  }

  async fn find_order(&self, order_id: Uuid) -> BazaarResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error("find_order"))?;
    row.map(Order::try_from).transpose()
  }

  async fn list_orders(&self, user_id: Uuid) -> BazaarResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 AND status <> 'CART' ORDER BY created_at DESC, id DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_error("list_orders"))?;
    rows.into_iter().map(Order::try_from).collect()
  }

  #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status), err)]
  async fn save_order(&self, order: &Order) -> BazaarResult<()> {
    sqlx::query(
      "INSERT INTO orders (id, user_id, status, total_price, delivery_address, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) \
       ON CONFLICT (id) DO UPDATE SET \
         status = EXCLUDED.status, \
         total_price = EXCLUDED.total_price, \
         delivery_address = EXCLUDED.delivery_address, \
         updated_at = EXCLUDED.updated_at",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.status.as_str())
    .bind(order.total_price)
    .bind(order.delivery_address.as_deref())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await
    .map_err(db_error("save_order"))?;
    Ok(())
  }

  #[instrument(skip(self, order), fields(order_id = %order.id), err)]
  async fn checkout_order(&self, order: &Order) -> BazaarResult<Order> {
    let mut tx = self.pool.begin().await.map_err(db_error("begin_checkout"))?;

    let placed = sqlx::query(
      "UPDATE orders SET status = $2, total_price = $3, delivery_address = $4, updated_at = $5 \
       WHERE id = $1 AND status = 'CART'",
    )
    .bind(order.id)
    .bind(order.status.as_str())
    .bind(order.total_price)
    .bind(order.delivery_address.as_deref())
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(db_error("place_order"))?;

    if placed.rows_affected() != 1 {
      return Err(BazaarError::InvalidState(format!("Order {} is no longer a cart", order.id)));
    }

    let next_cart = Order::new_cart(order.user_id);
    sqlx::query(
      "INSERT INTO orders (id, user_id, status, total_price, created_at, updated_at) \
       VALUES ($1, $2, $3, 0, $4, $5)",
    )
    .bind(next_cart.id)
    .bind(next_cart.user_id)
    .bind(OrderStatus::Cart.as_str())
    .bind(next_cart.created_at)
    .bind(next_cart.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(db_error("provision_cart"))?;

    tx.commit().await.map_err(db_error("commit_checkout"))?;
    Ok(next_cart)
  }

  async fn find_line_item(&self, order_id: Uuid, product_id: ProductId) -> BazaarResult<Option<LineItem>> {
    let row: Option<LineItemRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_line_items WHERE order_id = $1 AND product_id = $2",
      LINE_ITEM_COLUMNS
    ))
    .bind(order_id)
    .bind(product_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error("find_line_item"))?;
    Ok(row.map(LineItem::from))
  }

  async fn get_line_item(&self, item_id: Uuid) -> BazaarResult<Option<LineItem>> {
    let row: Option<LineItemRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_line_items WHERE id = $1",
      LINE_ITEM_COLUMNS
    ))
    .bind(item_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error("get_line_item"))?;
    Ok(row.map(LineItem::from))
  }

  #[instrument(skip(self, cart, change), fields(order_id = %cart.id, change = change.kind()), err)]
  async fn commit_cart(&self, cart: &Order, change: &CartChange) -> BazaarResult<()> {
    let mut tx = self.pool.begin().await.map_err(db_error("begin_commit_cart"))?;

    // Updating the cart row first locks it and confirms it is still a cart.
    let touched = sqlx::query(
      "UPDATE orders SET total_price = $2, updated_at = $3 WHERE id = $1 AND status = 'CART'",
    )
    .bind(cart.id)
    .bind(cart.total_price)
    .bind(cart.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(db_error("update_cart_total"))?;

    if touched.rows_affected() != 1 {
      return Err(BazaarError::InvalidState(format!("Order {} is no longer a cart", cart.id)));
    }

    match change {
      CartChange::UpsertItem(item) => {
        if item.order_id != cart.id {
          return Err(BazaarError::Internal(format!(
            "Line item {} belongs to order {}, not {}",
            item.id, item.order_id, cart.id
          )));
        }
        // Only the quantity is mutable; the price and name snapshots are write-once.
        sqlx::query(
          "INSERT INTO order_line_items (id, order_id, product_id, product_name, quantity, unit_price, created_at) \
           VALUES ($1, $2, $3, $4, $5, $6, $7) \
           ON CONFLICT (id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("upsert_line_item"))?;
      }
      CartChange::RemoveItem(item_id) => {
        sqlx::query("DELETE FROM order_line_items WHERE id = $1 AND order_id = $2")
          .bind(item_id)
          .bind(cart.id)
          .execute(&mut *tx)
          .await
          .map_err(db_error("delete_line_item"))?;
      }
      CartChange::RemoveAllItems => {
        sqlx::query("DELETE FROM order_line_items WHERE order_id = $1")
          .bind(cart.id)
          .execute(&mut *tx)
          .await
          .map_err(db_error("delete_line_items"))?;
      }
    }

    tx.commit().await.map_err(db_error("commit_cart"))?;
    Ok(())
  }

  async fn list_line_items(&self, order_id: Uuid) -> BazaarResult<Vec<LineItem>> {
    let rows: Vec<LineItemRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_line_items WHERE order_id = $1 ORDER BY created_at, id",
      LINE_ITEM_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_error("list_line_items"))?;
    Ok(rows.into_iter().map(LineItem::from).collect())
  }
}
