// bazaar/src/lifecycle/cart_flows.rs

//! Flows for the CART-internal operations: add, change quantity, clear.

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use super::common_steps::commit_cart_step;
use super::contexts::{AddItemCtx, ChangeQuantityCtx, ClearCartCtx};
use crate::error::{BazaarError, BazaarResult};
use crate::flow::{ContextData, Flow, StepControl};
use crate::model::LineItem;
use crate::store::CartChange;

pub fn build_add_item_flow() -> Flow<AddItemCtx> {
  let mut flow = Flow::new(
    "add_item",
    &[
      ("validate_request", false, None),
      ("load_cart", false, None),
      ("resolve_product", false, None),
      ("merge_line_item", false, None),
      ("commit_cart", false, None),
    ],
  );
  flow.on("validate_request", validate_add_request);
  flow.on("load_cart", load_or_create_cart);
  flow.on("resolve_product", resolve_product);
  flow.on("merge_line_item", merge_line_item);
  flow.on("commit_cart", commit_cart_step::<AddItemCtx>);
  flow
}

pub fn build_change_quantity_flow() -> Flow<ChangeQuantityCtx> {
  let mut flow = Flow::new(
    "change_quantity",
    &[
      ("load_cart", false, None),
      ("load_line_item", false, None),
      ("apply_quantity", false, None),
      ("commit_cart", false, None),
    ],
  );
  flow.on("load_cart", load_existing_cart);
  flow.on("load_line_item", load_owned_line_item);
  flow.on("apply_quantity", apply_quantity);
  flow.on("commit_cart", commit_cart_step::<ChangeQuantityCtx>);
  flow
}

pub fn build_clear_cart_flow() -> Flow<ClearCartCtx> {
  let mut flow = Flow::new(
    "clear_cart",
    &[
      ("load_cart", false, None),
      ("stage_clear", false, None),
      ("commit_cart", false, None),
    ],
  );
  flow.on("load_cart", load_cart_if_any);
  flow.on("stage_clear", stage_clear);
  flow.on("commit_cart", commit_cart_step::<ClearCartCtx>);
  flow
}

// --- add_item ---

async fn validate_add_request(ctx_data: ContextData<AddItemCtx>) -> BazaarResult<StepControl> {
  let (product_id, quantity) = {
    let guard = ctx_data.read();
    (guard.product_id, guard.quantity)
  };
  if quantity < 1 {
    warn!(product_id, quantity, "Rejecting add with non-positive quantity.");
    return Err(BazaarError::InvalidState(format!(
      "Quantity must be at least 1, got {}",
      quantity
    )));
  }
  if product_id <= 0 {
    warn!(product_id, "Rejecting add with non-positive product id.");
    return Err(BazaarError::InvalidState(format!(
      "Product id must be positive, got {}",
      product_id
    )));
  }
  Ok(StepControl::Continue)
}

async fn load_or_create_cart(ctx_data: ContextData<AddItemCtx>) -> BazaarResult<StepControl> {
  let (store, user_id) = {
    let guard = ctx_data.read();
    (guard.services.store.clone(), guard.user_id)
  };
  let cart = store.get_or_create_cart(user_id).await?;
  ctx_data.write().cart = Some(cart);
  Ok(StepControl::Continue)
}

#[instrument(name = "add_item::resolve_product", skip(ctx_data), err)]
async fn resolve_product(ctx_data: ContextData<AddItemCtx>) -> BazaarResult<StepControl> {
  let (products, product_id) = {
    let guard = ctx_data.read();
    (guard.services.products.clone(), guard.product_id)
  };

  // NotFound and Unavailable propagate unchanged.
  let snapshot = products.resolve(product_id).await?;

  if !snapshot.availability.is_purchasable() {
    warn!(product_id, status = %snapshot.availability, "Product is not available for purchase.");
    return Err(BazaarError::InvalidState(format!(
      "Product {} is not available for purchase (status {})",
      product_id, snapshot.availability
    )));
  }
  if snapshot.unit_price < Decimal::ZERO {
    warn!(product_id, unit_price = %snapshot.unit_price, "Product service reported a negative price.");
    return Err(BazaarError::InvalidState(format!(
      "Product {} has a negative price {}",
      product_id, snapshot.unit_price
    )));
  }

  ctx_data.write().snapshot = Some(snapshot);
  Ok(StepControl::Continue)
}

async fn merge_line_item(ctx_data: ContextData<AddItemCtx>) -> BazaarResult<StepControl> {
  let (store, order_id, snapshot, quantity) = {
    let guard = ctx_data.read();
    let order_id = guard.cart.as_ref().map(|c| c.id);
    (guard.services.store.clone(), order_id, guard.snapshot.clone(), guard.quantity)
  };
  let (order_id, snapshot) = match (order_id, snapshot) {
    (Some(order_id), Some(snapshot)) => (order_id, snapshot),
    _ => {
      return Err(BazaarError::Internal(
        "merge_line_item ran without a cart and product snapshot".to_string(),
      ))
    }
  };

  let item = match store.find_line_item(order_id, snapshot.id).await? {
    Some(mut existing) => {
      // Keep the original price snapshot; only the quantity grows.
      existing.quantity = existing.quantity.checked_add(quantity).ok_or_else(|| {
        BazaarError::InvalidState(format!("Quantity for product {} would overflow", snapshot.id))
      })?;
      existing
    }
    None => LineItem::from_snapshot(order_id, &snapshot, quantity),
  };

  debug!(
    order_id = %order_id,
    product_id = item.product_id,
    quantity = item.quantity,
    "Line item merge staged."
  );
  let mut guard = ctx_data.write();
  guard.change = Some(CartChange::UpsertItem(item.clone()));
  guard.merged_item = Some(item);
  Ok(StepControl::Continue)
}

// --- change_quantity ---

async fn load_existing_cart(ctx_data: ContextData<ChangeQuantityCtx>) -> BazaarResult<StepControl> {
  let (store, user_id, item_id) = {
    let guard = ctx_data.read();
    (guard.services.store.clone(), guard.user_id, guard.item_id)
  };
  // Without a cart no item can belong to it.
  let cart = store
    .find_cart(user_id)
    .await?
    .ok_or_else(|| BazaarError::line_item_not_found(item_id))?;
  ctx_data.write().cart = Some(cart);
  Ok(StepControl::Continue)
}

async fn load_owned_line_item(ctx_data: ContextData<ChangeQuantityCtx>) -> BazaarResult<StepControl> {
  let (store, item_id, cart_id) = {
    let guard = ctx_data.read();
    (guard.services.store.clone(), guard.item_id, guard.cart.as_ref().map(|c| c.id))
  };

  let item = store
    .get_line_item(item_id)
    .await?
    .filter(|item| Some(item.order_id) == cart_id)
    .ok_or_else(|| {
      warn!(item_id = %item_id, "Line item is not part of the user's cart.");
      BazaarError::line_item_not_found(item_id)
    })?;

  ctx_data.write().item = Some(item);
  Ok(StepControl::Continue)
}

async fn apply_quantity(ctx_data: ContextData<ChangeQuantityCtx>) -> BazaarResult<StepControl> {
  let mut guard = ctx_data.write();
  let quantity = guard.quantity;
  let mut item = guard
    .item
    .take()
    .ok_or_else(|| BazaarError::Internal("apply_quantity ran before the line item was loaded".to_string()))?;

  if quantity <= 0 {
    debug!(item_id = %item.id, product_id = item.product_id, "Line item removal staged.");
    guard.removed = true;
    guard.change = Some(CartChange::RemoveItem(item.id));
  } else {
    item.quantity = quantity;
    debug!(item_id = %item.id, quantity, "Line item quantity change staged.");
    guard.change = Some(CartChange::UpsertItem(item.clone()));
    guard.item = Some(item);
  }
  Ok(StepControl::Continue)
}

// --- clear_cart ---

async fn load_cart_if_any(ctx_data: ContextData<ClearCartCtx>) -> BazaarResult<StepControl> {
  let (store, user_id) = {
    let guard = ctx_data.read();
    (guard.services.store.clone(), guard.user_id)
  };
  match store.find_cart(user_id).await? {
    Some(cart) => {
      ctx_data.write().cart = Some(cart);
      Ok(StepControl::Continue)
    }
    // No cart yet is an implicitly empty cart: nothing to clear.
    None => Ok(StepControl::Stop),
  }
}

async fn stage_clear(ctx_data: ContextData<ClearCartCtx>) -> BazaarResult<StepControl> {
  let (store, cart) = {
    let guard = ctx_data.read();
    (guard.services.store.clone(), guard.cart.clone())
  };
  let cart = cart.ok_or_else(|| BazaarError::Internal("stage_clear ran before the cart was loaded".to_string()))?;

  let items = store.list_line_items(cart.id).await?;
  if items.is_empty() && cart.total_price.is_zero() {
    debug!(order_id = %cart.id, "Cart already empty.");
    return Ok(StepControl::Stop);
  }

  let mut guard = ctx_data.write();
  guard.deleted_items = items.len();
  guard.change = Some(CartChange::RemoveAllItems);
  Ok(StepControl::Continue)
}
