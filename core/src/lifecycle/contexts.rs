// bazaar/src/lifecycle/contexts.rs

//! Data threaded through each cart flow. Handlers receive these wrapped in
//! `ContextData`, copy out what they need, and write results back.

use std::sync::Arc;
use uuid::Uuid;

use crate::model::{LineItem, Order, ProductId, ProductSnapshot};
use crate::resilience::GuardedResolver;
use crate::store::{CartChange, OrderStore};

/// Collaborators every flow step may reach.
#[derive(Clone)]
pub struct CartServices {
  pub store: Arc<dyn OrderStore>,
  pub products: Arc<GuardedResolver>,
}

impl std::fmt::Debug for CartServices {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CartServices").field("products", &self.products).finish_non_exhaustive()
  }
}

/// Implemented by contexts whose flow ends by committing a staged change.
pub trait HasCart {
  fn services(&self) -> &CartServices;
  fn cart(&self) -> Option<&Order>;
  fn cart_mut(&mut self) -> Option<&mut Order>;
  fn pending_change(&self) -> Option<&CartChange>;
}

macro_rules! impl_has_cart {
  ($ctx:ty) => {
    impl HasCart for $ctx {
      fn services(&self) -> &CartServices {
        &self.services
      }
      fn cart(&self) -> Option<&Order> {
        self.cart.as_ref()
      }
      fn cart_mut(&mut self) -> Option<&mut Order> {
        self.cart.as_mut()
      }
      fn pending_change(&self) -> Option<&CartChange> {
        self.change.as_ref()
      }
    }
  };
}

#[derive(Debug, Clone)]
pub struct AddItemCtx {
  pub services: CartServices,
  pub user_id: Uuid,
  pub product_id: ProductId,
  pub quantity: i32,
  pub cart: Option<Order>,
  pub snapshot: Option<ProductSnapshot>,
  pub merged_item: Option<LineItem>,
  pub change: Option<CartChange>,
}

impl AddItemCtx {
  pub fn new(services: CartServices, user_id: Uuid, product_id: ProductId, quantity: i32) -> Self {
    Self {
      services,
      user_id,
      product_id,
      quantity,
      cart: None,
      snapshot: None,
      merged_item: None,
      change: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ChangeQuantityCtx {
  pub services: CartServices,
  pub user_id: Uuid,
  pub item_id: Uuid,
  pub quantity: i32,
  pub cart: Option<Order>,
  pub item: Option<LineItem>,
  /// Set when the change drops the item from the cart.
  pub removed: bool,
  pub change: Option<CartChange>,
}

impl ChangeQuantityCtx {
  pub fn new(services: CartServices, user_id: Uuid, item_id: Uuid, quantity: i32) -> Self {
    Self {
      services,
      user_id,
      item_id,
      quantity,
      cart: None,
      item: None,
      removed: false,
      change: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ClearCartCtx {
  pub services: CartServices,
  pub user_id: Uuid,
  pub cart: Option<Order>,
  pub deleted_items: usize,
  pub change: Option<CartChange>,
}

impl ClearCartCtx {
  pub fn new(services: CartServices, user_id: Uuid) -> Self {
    Self {
      services,
      user_id,
      cart: None,
      deleted_items: 0,
      change: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct CheckoutCtx {
  pub services: CartServices,
  pub user_id: Uuid,
  pub delivery_address: String,
  /// The cart being placed; PENDING once `freeze_order` has run.
  pub cart: Option<Order>,
  pub items: Vec<LineItem>,
  pub next_cart: Option<Order>,
}

impl CheckoutCtx {
  pub fn new(services: CartServices, user_id: Uuid, delivery_address: String) -> Self {
    Self {
      services,
      user_id,
      delivery_address,
      cart: None,
      items: Vec::new(),
      next_cart: None,
    }
  }
}

impl_has_cart!(AddItemCtx);
impl_has_cart!(ChangeQuantityCtx);
impl_has_cart!(ClearCartCtx);
