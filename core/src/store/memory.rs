// bazaar/src/store/memory.rs

//! `OrderStore` over in-process maps. Enforces the same uniqueness and foreign key
//! rules as the PostgreSQL schema so tests exercise real constraint behaviour.

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use super::{CartChange, OrderStore};
use crate::error::{BazaarError, BazaarResult};
use crate::model::{LineItem, Order, ProductId};

#[derive(Debug, Default)]
struct Tables {
  orders: HashMap<Uuid, Order>,
  /// user_id -> id of that user's CART order
  carts_by_user: HashMap<Uuid, Uuid>,
  items: HashMap<Uuid, LineItem>,
  /// (order_id, product_id) -> line item id
  item_keys: HashMap<(Uuid, ProductId), Uuid>,
}

impl Tables {
  fn check_order(&self, order: &Order) -> BazaarResult<()> {
    if order.is_cart() {
      if let Some(existing) = self.carts_by_user.get(&order.user_id).filter(|id| **id != order.id) {
        return Err(BazaarError::storage(anyhow!(
          "unique violation: user {} already has cart {}",
          order.user_id,
          existing
        )));
      }
    }
    Ok(())
  }

  fn put_order(&mut self, order: &Order) -> BazaarResult<()> {
    self.check_order(order)?;
    if order.is_cart() {
      self.carts_by_user.insert(order.user_id, order.id);
    } else if self.carts_by_user.get(&order.user_id) == Some(&order.id) {
      self.carts_by_user.remove(&order.user_id);
    }
    self.orders.insert(order.id, order.clone());
    Ok(())
  }

  fn check_item(&self, item: &LineItem) -> BazaarResult<()> {
    if !self.orders.contains_key(&item.order_id) {
      return Err(BazaarError::storage(anyhow!(
        "foreign key violation: order {} does not exist",
        item.order_id
      )));
    }
    if item.quantity < 1 {
      return Err(BazaarError::storage(anyhow!(
        "check violation: line item {} quantity {} < 1",
        item.id,
        item.quantity
      )));
    }
    if item.unit_price < rust_decimal::Decimal::ZERO {
      return Err(BazaarError::storage(anyhow!(
        "check violation: line item {} unit price {} < 0",
        item.id,
        item.unit_price
      )));
    }
    if let Some(existing) = self
      .item_keys
      .get(&(item.order_id, item.product_id))
      .filter(|id| **id != item.id)
    {
      return Err(BazaarError::storage(anyhow!(
        "unique violation: order {} already has line item {} for product {}",
        item.order_id,
        existing,
        item.product_id
      )));
    }
    Ok(())
  }

  fn put_item(&mut self, item: &LineItem) {
    self.item_keys.insert((item.order_id, item.product_id), item.id);
    self.items.insert(item.id, item.clone());
  }

  fn remove_item(&mut self, order_id: Uuid, item_id: Uuid) {
    if self.items.get(&item_id).is_some_and(|item| item.order_id == order_id) {
      if let Some(item) = self.items.remove(&item_id) {
        self.item_keys.remove(&(item.order_id, item.product_id));
      }
    }
  }

  fn remove_items_of(&mut self, order_id: Uuid) {
    self.items.retain(|_, item| item.order_id != order_id);
    self.item_keys.retain(|(item_order, _), _| *item_order != order_id);
  }
}

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
  tables: Mutex<Tables>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of CART orders held for `user_id`. Used to check the singleton-cart rule.
  pub fn cart_count(&self, user_id: Uuid) -> usize {
    self
      .tables
      .lock()
      .orders
      .values()
      .filter(|o| o.user_id == user_id && o.is_cart())
      .count()
  }

  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  pub fn line_item_count(&self) -> usize {
    self.tables.lock().items.len()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn get_or_create_cart(&self, user_id: Uuid) -> BazaarResult<Order> {
    let mut tables = self.tables.lock();
    if let Some(cart) = tables.carts_by_user.get(&user_id).and_then(|id| tables.orders.get(id)) {
      return Ok(cart.clone());
    }
    let cart = Order::new_cart(user_id);
    tables.put_order(&cart)?;
    Ok(cart)
  }

  async fn find_cart(&self, user_id: Uuid) -> BazaarResult<Option<Order>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .carts_by_user
        .get(&user_id)
        .and_then(|id| tables.orders.get(id))
        .cloned(),
    )
  }

  async fn find_order(&self, order_id: Uuid) -> BazaarResult<Option<Order>> {
    Ok(self.tables.lock().orders.get(&order_id).cloned())
  }

  async fn list_orders(&self, user_id: Uuid) -> BazaarResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .lock()
      .orders
      .values()
      .filter(|o| o.user_id == user_id && !o.is_cart())
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(orders)
  }

  async fn save_order(&self, order: &Order) -> BazaarResult<()> {
    self.tables.lock().put_order(order)
  }

  async fn checkout_order(&self, order: &Order) -> BazaarResult<Order> {
    if order.is_cart() {
      return Err(BazaarError::Internal(format!(
        "checkout_order called with order {} still in CART",
        order.id
      )));
    }
    let mut tables = self.tables.lock();
    tables.put_order(order)?;
    let next_cart = Order::new_cart(order.user_id);
    tables.put_order(&next_cart)?;
    Ok(next_cart)
  }

  async fn find_line_item(&self, order_id: Uuid, product_id: ProductId) -> BazaarResult<Option<LineItem>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .item_keys
        .get(&(order_id, product_id))
        .and_then(|id| tables.items.get(id))
        .cloned(),
    )
  }

  async fn get_line_item(&self, item_id: Uuid) -> BazaarResult<Option<LineItem>> {
    Ok(self.tables.lock().items.get(&item_id).cloned())
  }

  async fn commit_cart(&self, cart: &Order, change: &CartChange) -> BazaarResult<()> {
    let mut tables = self.tables.lock();

    // Validate everything first; nothing is written unless the whole change fits.
    let stored_is_cart = tables.orders.get(&cart.id).map(Order::is_cart).unwrap_or(false);
    if !stored_is_cart || !cart.is_cart() {
      return Err(BazaarError::InvalidState(format!("Order {} is no longer a cart", cart.id)));
    }
    if cart.total_price < rust_decimal::Decimal::ZERO {
      return Err(BazaarError::storage(anyhow!(
        "check violation: order {} total {} < 0",
        cart.id,
        cart.total_price
      )));
    }
    tables.check_order(cart)?;
    match change {
      CartChange::UpsertItem(item) if item.order_id != cart.id => {
        return Err(BazaarError::Internal(format!(
          "line item {} belongs to order {}, not cart {}",
          item.id, item.order_id, cart.id
        )))
      }
      CartChange::UpsertItem(item) => tables.check_item(item)?,
      CartChange::RemoveItem(_) | CartChange::RemoveAllItems => {}
    }

    match change {
      CartChange::UpsertItem(item) => tables.put_item(item),
      CartChange::RemoveItem(item_id) => tables.remove_item(cart.id, *item_id),
      CartChange::RemoveAllItems => tables.remove_items_of(cart.id),
    }
    tables.put_order(cart)
  }

  async fn list_line_items(&self, order_id: Uuid) -> BazaarResult<Vec<LineItem>> {
    Ok(
      self
        .tables
        .lock()
        .items
        .values()
        .filter(|item| item.order_id == order_id)
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{OrderStatus, ProductSnapshot, ProductStatus};
  use rust_decimal::Decimal;

  fn snapshot(id: ProductId) -> ProductSnapshot {
    ProductSnapshot {
      id,
      unit_price: Decimal::new(1000, 2),
      display_name: format!("Product {}", id),
      availability: ProductStatus::Active,
    }
  }

  #[tokio::test]
  async fn get_or_create_returns_the_same_cart() {
    let store = InMemoryOrderStore::new();
    let user = Uuid::new_v4();
    let first = store.get_or_create_cart(user).await.unwrap();
    let second = store.get_or_create_cart(user).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.total_price, Decimal::ZERO);
    assert_eq!(store.cart_count(user), 1);
  }

  #[tokio::test]
  async fn second_cart_for_a_user_is_rejected() {
    let store = InMemoryOrderStore::new();
    let user = Uuid::new_v4();
    store.get_or_create_cart(user).await.unwrap();
    let err = store.save_order(&Order::new_cart(user)).await.unwrap_err();
    assert!(matches!(err, BazaarError::Storage { .. }));
  }

  #[tokio::test]
  async fn duplicate_product_in_one_order_is_rejected() {
    let store = InMemoryOrderStore::new();
    let cart = store.get_or_create_cart(Uuid::new_v4()).await.unwrap();
    let first = LineItem::from_snapshot(cart.id, &snapshot(7), 1);
    store.commit_cart(&cart, &CartChange::UpsertItem(first)).await.unwrap();

    let duplicate = LineItem::from_snapshot(cart.id, &snapshot(7), 1);
    let err = store
      .commit_cart(&cart, &CartChange::UpsertItem(duplicate))
      .await
      .unwrap_err();
    assert!(matches!(err, BazaarError::Storage { .. }));
    assert_eq!(store.line_item_count(), 1);
  }

  #[tokio::test]
  async fn rejected_commit_leaves_items_and_total_untouched() {
    let store = InMemoryOrderStore::new();
    let mut cart = store.get_or_create_cart(Uuid::new_v4()).await.unwrap();
    let mut item = LineItem::from_snapshot(cart.id, &snapshot(7), 1);
    item.quantity = 0;
    cart.total_price = Decimal::new(999, 0);

    let err = store.commit_cart(&cart, &CartChange::UpsertItem(item)).await.unwrap_err();

    assert!(matches!(err, BazaarError::Storage { .. }));
    assert_eq!(store.line_item_count(), 0);
    let stored = store.find_cart(cart.user_id).await.unwrap().unwrap();
    assert_eq!(stored.total_price, Decimal::ZERO);
  }

  #[tokio::test]
  async fn commit_on_a_placed_order_is_invalid() {
    let store = InMemoryOrderStore::new();
    let mut cart = store.get_or_create_cart(Uuid::new_v4()).await.unwrap();
    cart.transition_to(OrderStatus::Pending).unwrap();
    store.checkout_order(&cart).await.unwrap();

    let item = LineItem::from_snapshot(cart.id, &snapshot(7), 1);
    let err = store.commit_cart(&cart, &CartChange::UpsertItem(item)).await.unwrap_err();
    assert!(matches!(err, BazaarError::InvalidState(_)));
    assert_eq!(store.line_item_count(), 0);
  }

  #[tokio::test]
  async fn remove_all_items_clears_only_that_cart() {
    let store = InMemoryOrderStore::new();
    let first = store.get_or_create_cart(Uuid::new_v4()).await.unwrap();
    let second = store.get_or_create_cart(Uuid::new_v4()).await.unwrap();
    for (cart, product) in [(&first, 1), (&first, 2), (&second, 1)] {
      let item = LineItem::from_snapshot(cart.id, &snapshot(product), 1);
      store.commit_cart(cart, &CartChange::UpsertItem(item)).await.unwrap();
    }

    store.commit_cart(&first, &CartChange::RemoveAllItems).await.unwrap();

    assert!(store.list_line_items(first.id).await.unwrap().is_empty());
    assert_eq!(store.list_line_items(second.id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn checkout_order_swaps_in_a_fresh_cart() {
    let store = InMemoryOrderStore::new();
    let user = Uuid::new_v4();
    let mut cart = store.get_or_create_cart(user).await.unwrap();
    cart.transition_to(OrderStatus::Pending).unwrap();

    let next = store.checkout_order(&cart).await.unwrap();

    assert_ne!(next.id, cart.id);
    assert_eq!(store.find_cart(user).await.unwrap().map(|c| c.id), Some(next.id));
    assert_eq!(store.list_orders(user).await.unwrap().len(), 1);
    assert_eq!(store.cart_count(user), 1);
  }
}
