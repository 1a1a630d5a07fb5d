// bazaar/src/store/mod.rs

//! Persistence contract for orders and their line items.
//!
//! Stores guarantee atomic get-or-create of a user's cart, at most one CART order
//! per user, and at most one line item per (order, product). Every cart mutation
//! lands through `commit_cart`, which writes the line item change and the new total
//! together. Stores do not serialize read-modify-write cycles; the lifecycle
//! controller does that per user.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BazaarResult;
use crate::model::{LineItem, Order, ProductId};

pub use memory::InMemoryOrderStore;

/// One line item mutation, committed together with the recomputed cart total.
#[derive(Debug, Clone, PartialEq)]
pub enum CartChange {
  /// Insert a new item or overwrite the quantity of an existing one.
  UpsertItem(LineItem),
  RemoveItem(Uuid),
  RemoveAllItems,
}

impl CartChange {
  /// Applies the change to an in-memory copy of the cart's items, giving the item
  /// set the store will hold once the change is committed.
  pub fn apply_to(&self, items: &mut Vec<LineItem>) {
    match self {
      CartChange::UpsertItem(item) => match items.iter_mut().find(|existing| existing.id == item.id) {
        Some(existing) => *existing = item.clone(),
        None => items.push(item.clone()),
      },
      CartChange::RemoveItem(item_id) => items.retain(|existing| existing.id != *item_id),
      CartChange::RemoveAllItems => items.clear(),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      CartChange::UpsertItem(_) => "upsert_item",
      CartChange::RemoveItem(_) => "remove_item",
      CartChange::RemoveAllItems => "remove_all_items",
    }
  }
}

#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
  /// The user's CART order, created empty (total 0) if none exists.
  /// Concurrent first calls for the same user yield the same order.
  async fn get_or_create_cart(&self, user_id: Uuid) -> BazaarResult<Order>;

  async fn find_cart(&self, user_id: Uuid) -> BazaarResult<Option<Order>>;

  async fn find_order(&self, order_id: Uuid) -> BazaarResult<Option<Order>>;

  /// The user's placed (non-CART) orders, newest first.
  async fn list_orders(&self, user_id: Uuid) -> BazaarResult<Vec<Order>>;

  /// Inserts or overwrites the order row with the same id.
  async fn save_order(&self, order: &Order) -> BazaarResult<()>;

  /// Persists a just-placed order and provisions the user's next empty cart as one
  /// unit. Returns the new cart.
  async fn checkout_order(&self, order: &Order) -> BazaarResult<Order>;

  async fn find_line_item(&self, order_id: Uuid, product_id: ProductId) -> BazaarResult<Option<LineItem>>;

  async fn get_line_item(&self, item_id: Uuid) -> BazaarResult<Option<LineItem>>;

  /// Applies `change` to the items of `cart` and saves `cart` (carrying its
  /// recomputed total) as one unit: either both land or neither does.
  ///
  /// Fails with `InvalidState` if `cart` is no longer a CART order. A second item for
  /// the same (order, product) pair is a storage error.
  async fn commit_cart(&self, cart: &Order, change: &CartChange) -> BazaarResult<()>;

  async fn list_line_items(&self, order_id: Uuid) -> BazaarResult<Vec<LineItem>>;
}
