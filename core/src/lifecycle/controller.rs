// bazaar/src/lifecycle/controller.rs

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::cart_flows::{build_add_item_flow, build_change_quantity_flow, build_clear_cart_flow};
use super::checkout_flow::build_checkout_flow;
use super::contexts::{AddItemCtx, CartServices, ChangeQuantityCtx, CheckoutCtx, ClearCartCtx};
use super::locks::UserLocks;
use crate::error::{BazaarError, BazaarResult};
use crate::flow::{ContextData, Flow};
use crate::model::{Order, OrderStatus, OrderView, ProductId};
use crate::resilience::GuardedResolver;
use crate::store::OrderStore;

/// Entry point for every cart and order operation.
///
/// All operations touching one user's orders run under that user's lock, so a
/// read-modify-write cycle (load cart, merge item, recompute total) is never
/// interleaved with another for the same user. Different users run in parallel.
pub struct CartController {
  services: CartServices,
  locks: UserLocks,
  add_item_flow: Flow<AddItemCtx>,
  change_quantity_flow: Flow<ChangeQuantityCtx>,
  clear_cart_flow: Flow<ClearCartCtx>,
  checkout_flow: Flow<CheckoutCtx>,
}

impl std::fmt::Debug for CartController {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CartController")
      .field("services", &self.services)
      .field("active_users", &self.locks.active_users())
      .finish()
  }
}

impl CartController {
  pub fn new(store: Arc<dyn OrderStore>, products: Arc<GuardedResolver>) -> Self {
    Self {
      services: CartServices { store, products },
      locks: UserLocks::new(),
      add_item_flow: build_add_item_flow(),
      change_quantity_flow: build_change_quantity_flow(),
      clear_cart_flow: build_clear_cart_flow(),
      checkout_flow: build_checkout_flow(),
    }
  }

  pub fn store(&self) -> &Arc<dyn OrderStore> {
    &self.services.store
  }

  pub fn products(&self) -> &Arc<GuardedResolver> {
    &self.services.products
  }

  /// The user's cart, created empty on first access.
  #[instrument(skip(self), err)]
  pub async fn get_cart(&self, user_id: Uuid) -> BazaarResult<OrderView> {
    let _lock = self.locks.acquire(user_id).await;
    let cart = self.services.store.get_or_create_cart(user_id).await?;
    self.view(&cart).await
  }

  /// Adds `quantity` of a product, merging into an existing line item for the same
  /// product. The price snapshot is taken only when the product first enters the cart.
  #[instrument(skip(self), err)]
  pub async fn add_item(&self, user_id: Uuid, product_id: ProductId, quantity: i32) -> BazaarResult<OrderView> {
    let _lock = self.locks.acquire(user_id).await;
    let ctx_data = ContextData::new(AddItemCtx::new(self.services.clone(), user_id, product_id, quantity));
    self.add_item_flow.run(ctx_data.clone()).await?;
    let cart = Self::loaded_cart(ctx_data.into_inner().cart)?;
    self.view(&cart).await
  }

  /// Sets a line item's quantity; zero or less removes it.
  #[instrument(skip(self), err)]
  pub async fn update_item_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> BazaarResult<OrderView> {
    let _lock = self.locks.acquire(user_id).await;
    let ctx_data = ContextData::new(ChangeQuantityCtx::new(self.services.clone(), user_id, item_id, quantity));
    self.change_quantity_flow.run(ctx_data.clone()).await?;
    let cart = Self::loaded_cart(ctx_data.into_inner().cart)?;
    self.view(&cart).await
  }

  pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> BazaarResult<OrderView> {
    self.update_item_quantity(user_id, item_id, 0).await
  }

  /// Empties the cart. Succeeds on an already-empty or never-created cart.
  #[instrument(skip(self), err)]
  pub async fn clear_cart(&self, user_id: Uuid) -> BazaarResult<()> {
    let _lock = self.locks.acquire(user_id).await;
    let ctx_data = ContextData::new(ClearCartCtx::new(self.services.clone(), user_id));
    self.clear_cart_flow.run(ctx_data).await?;
    Ok(())
  }

  /// Places the cart as a PENDING order and provisions a fresh empty cart.
  #[instrument(skip(self, delivery_address), err)]
  pub async fn checkout(&self, user_id: Uuid, delivery_address: &str) -> BazaarResult<OrderView> {
    let _lock = self.locks.acquire(user_id).await;
    let ctx_data = ContextData::new(CheckoutCtx::new(
      self.services.clone(),
      user_id,
      delivery_address.to_string(),
    ));
    self.checkout_flow.run(ctx_data.clone()).await?;
    let ctx = ctx_data.into_inner();
    let order = Self::loaded_cart(ctx.cart)?;
    Ok(OrderView::from_parts(&order, &ctx.items))
  }

  /// One of the user's orders (cart included). Orders of other users are reported
  /// as not found.
  #[instrument(skip(self), err)]
  pub async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> BazaarResult<OrderView> {
    let order = self
      .services
      .store
      .find_order(order_id)
      .await?
      .filter(|o| o.user_id == user_id)
      .ok_or_else(|| BazaarError::order_not_found(order_id))?;
    self.view(&order).await
  }

  /// The user's placed orders, newest first.
  #[instrument(skip(self), err)]
  pub async fn list_orders(&self, user_id: Uuid) -> BazaarResult<Vec<OrderView>> {
    let orders = self.services.store.list_orders(user_id).await?;
    let mut views = Vec::with_capacity(orders.len());
    for order in &orders {
      views.push(self.view(order).await?);
    }
    Ok(views)
  }

  /// Moves a placed order along PENDING → PROCESSING → SHIPPED → DELIVERED or to
  /// CANCELED on behalf of fulfilment. Carts only leave CART through `checkout`.
  #[instrument(skip(self), err)]
  pub async fn transition_order(&self, order_id: Uuid, target: OrderStatus) -> BazaarResult<OrderView> {
    self.move_order(order_id, target, None).await
  }

  /// Cancels one of the user's own orders. Orders of other users are reported as
  /// not found and left untouched.
  #[instrument(skip(self), err)]
  pub async fn cancel_order(&self, user_id: Uuid, order_id: Uuid) -> BazaarResult<OrderView> {
    self.move_order(order_id, OrderStatus::Canceled, Some(user_id)).await
  }

  async fn move_order(&self, order_id: Uuid, target: OrderStatus, owned_by: Option<Uuid>) -> BazaarResult<OrderView> {
    let owned = |order: &Order| owned_by.map_or(true, |user_id| order.user_id == user_id);
    let owner = self
      .services
      .store
      .find_order(order_id)
      .await?
      .filter(|o| owned(o))
      .ok_or_else(|| BazaarError::order_not_found(order_id))?
      .user_id;

    let _lock = self.locks.acquire(owner).await;
    // Re-read under the lock; a checkout may have just placed this order.
    let mut order = self
      .services
      .store
      .find_order(order_id)
      .await?
      .filter(|o| owned(o))
      .ok_or_else(|| BazaarError::order_not_found(order_id))?;

    if order.is_cart() || target == OrderStatus::Cart {
      warn!(order_id = %order_id, from = %order.status, to = %target, "Rejected transition touching CART.");
      return Err(BazaarError::InvalidState(format!(
        "Order {} cannot move from {} to {}; carts change state only through checkout",
        order_id, order.status, target
      )));
    }

    let from = order.status;
    order.transition_to(target)?;
    self.services.store.save_order(&order).await?;
    info!(order_id = %order_id, %from, to = %target, "Order status changed.");
    self.view(&order).await
  }

  async fn view(&self, order: &Order) -> BazaarResult<OrderView> {
    let items = self.services.store.list_line_items(order.id).await?;
    Ok(OrderView::from_parts(order, &items))
  }

  fn loaded_cart(cart: Option<Order>) -> BazaarResult<Order> {
    cart.ok_or_else(|| BazaarError::Internal("flow completed without loading a cart".to_string()))
  }
}
