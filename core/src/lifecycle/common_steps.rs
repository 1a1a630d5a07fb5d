// bazaar/src/lifecycle/common_steps.rs

use tracing::{info, instrument};

use super::contexts::HasCart;
use crate::error::{BazaarError, BazaarResult};
use crate::flow::{ContextData, StepControl};
use crate::pricing;

/// Commits the staged line item change together with the recomputed cart total.
///
/// The total is computed from the stored items with the staged change applied, so
/// an overflowing total is rejected before anything is written, and a failed commit
/// leaves both the items and the total as they were.
#[instrument(name = "common_step::commit_cart", skip(ctx_data), err)]
pub async fn commit_cart_step<T>(ctx_data: ContextData<T>) -> BazaarResult<StepControl>
where
  T: HasCart + Send + Sync + 'static,
{
  let (store, order_id, change) = {
    let guard = ctx_data.read();
    let cart = guard
      .cart()
      .ok_or_else(|| BazaarError::Internal("commit_cart ran before the cart was loaded".to_string()))?;
    let change = guard
      .pending_change()
      .cloned()
      .ok_or_else(|| BazaarError::Internal("commit_cart ran without a staged change".to_string()))?;
    (guard.services().store.clone(), cart.id, change)
  };

  let mut items = store.list_line_items(order_id).await?;
  change.apply_to(&mut items);
  let total = pricing::recompute(&items)?;

  let updated = {
    let guard = ctx_data.read();
    let mut updated = guard
      .cart()
      .cloned()
      .ok_or_else(|| BazaarError::Internal("cart disappeared from flow context".to_string()))?;
    updated.total_price = total;
    updated.touch();
    updated
  };

  store.commit_cart(&updated, &change).await?;
  info!(order_id = %order_id, change = change.kind(), items = items.len(), %total, "Cart change committed.");

  if let Some(cart) = ctx_data.write().cart_mut() {
    *cart = updated;
  }
  Ok(StepControl::Continue)
}
