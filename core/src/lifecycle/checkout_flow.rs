// bazaar/src/lifecycle/checkout_flow.rs

//! CART → PENDING. The same order row becomes the permanent order record and a
//! fresh empty cart is provisioned alongside it.

use tracing::{info, instrument, warn};

use super::contexts::CheckoutCtx;
use crate::error::{BazaarError, BazaarResult};
use crate::flow::{ContextData, Flow, StepControl};
use crate::model::OrderStatus;
use crate::pricing;

pub fn build_checkout_flow() -> Flow<CheckoutCtx> {
  let mut flow = Flow::new(
    "checkout",
    &[
      ("validate_address", false, None),
      ("load_cart", false, None),
      ("ensure_not_empty", false, None),
      ("place_order", false, None),
    ],
  );
  flow.on("validate_address", validate_address);
  flow.on("load_cart", load_cart);
  flow.on("ensure_not_empty", ensure_not_empty);
  flow.on("place_order", place_order);
  flow
}

async fn validate_address(ctx_data: ContextData<CheckoutCtx>) -> BazaarResult<StepControl> {
  let mut guard = ctx_data.write();
  let trimmed = guard.delivery_address.trim().to_string();
  if trimmed.is_empty() {
    warn!(user_id = %guard.user_id, "Checkout rejected: empty delivery address.");
    return Err(BazaarError::InvalidState("Delivery address must not be empty".to_string()));
  }
  guard.delivery_address = trimmed;
  Ok(StepControl::Continue)
}

async fn load_cart(ctx_data: ContextData<CheckoutCtx>) -> BazaarResult<StepControl> {
  let (store, user_id) = {
    let guard = ctx_data.read();
    (guard.services.store.clone(), guard.user_id)
  };
  // Checkout never creates a cart; a user without one has nothing to order.
  let cart = store.find_cart(user_id).await?.ok_or_else(|| {
    warn!(user_id = %user_id, "Checkout rejected: user has no cart.");
    BazaarError::InvalidState("Cannot check out an empty cart".to_string())
  })?;
  ctx_data.write().cart = Some(cart);
  Ok(StepControl::Continue)
}

async fn ensure_not_empty(ctx_data: ContextData<CheckoutCtx>) -> BazaarResult<StepControl> {
  let (store, order_id) = {
    let guard = ctx_data.read();
    (guard.services.store.clone(), guard.cart.as_ref().map(|c| c.id))
  };
  let order_id =
    order_id.ok_or_else(|| BazaarError::Internal("ensure_not_empty ran before the cart was loaded".to_string()))?;

  let items = store.list_line_items(order_id).await?;
  if items.is_empty() {
    warn!(order_id = %order_id, "Checkout rejected: cart has no line items.");
    return Err(BazaarError::InvalidState("Cannot check out an empty cart".to_string()));
  }
  ctx_data.write().items = items;
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::place_order", skip(ctx_data), err)]
async fn place_order(ctx_data: ContextData<CheckoutCtx>) -> BazaarResult<StepControl> {
  let (store, order) = {
    let guard = ctx_data.read();
    let mut order = guard
      .cart
      .clone()
      .ok_or_else(|| BazaarError::Internal("place_order ran before the cart was loaded".to_string()))?;
    order.total_price = pricing::recompute(&guard.items)?;
    order.delivery_address = Some(guard.delivery_address.clone());
    order.transition_to(OrderStatus::Pending)?;
    (guard.services.store.clone(), order)
  };

  let next_cart = store.checkout_order(&order).await?;
  info!(
    order_id = %order.id,
    user_id = %order.user_id,
    total = %pricing::display_amount(order.total_price),
    next_cart_id = %next_cart.id,
    "Order placed."
  );
  let mut guard = ctx_data.write();
  guard.cart = Some(order);
  guard.next_cart = Some(next_cart);
  Ok(StepControl::Continue)
}
