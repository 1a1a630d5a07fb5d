// bazaar/examples/cart_walkthrough.rs

use bazaar::{
  BazaarError, BazaarResult, BreakerConfig, BreakerRegistry, CartController, GuardedResolver, InMemoryCatalog,
  InMemoryOrderStore, OrderStatus, ResilienceConfig,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> BazaarResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Cart Walkthrough ---");

  let catalog = Arc::new(InMemoryCatalog::new());
  catalog.insert(1, "Walnut desk lamp", Decimal::new(15000, 2));
  catalog.insert(2, "Linen tote", Decimal::new(1999, 2));

  let registry = Arc::new(BreakerRegistry::new(BreakerConfig::default()));
  let resolver = Arc::new(GuardedResolver::new(catalog.clone(), &registry, ResilienceConfig::default()));
  let controller = CartController::new(Arc::new(InMemoryOrderStore::new()), resolver);

  let user = Uuid::new_v4();
  controller.add_item(user, 1, 2).await?;
  let cart = controller.add_item(user, 2, 1).await?;
  info!(total = %cart.total_price, items = cart.item_count(), "Cart filled.");

  // Price changes after adding do not touch the snapshot.
  catalog.set_price(1, Decimal::new(9900, 2));
  let cart = controller.add_item(user, 1, 1).await?;
  info!(total = %cart.total_price, "Lamp quantity bumped at the original price.");

  match controller.add_item(user, 99, 1).await {
    Err(BazaarError::NotFound { entity, id }) => warn!(entity, id = %id, "Unknown product rejected."),
    other => warn!(?other, "Unexpected outcome for unknown product."),
  }

  let order = controller.checkout(user, "1 Main St").await?;
  info!(order_id = %order.id, status = %order.status, total = %order.total_price, "Order placed.");

  let order = controller.transition_order(order.id, OrderStatus::Processing).await?;
  info!(status = %order.status, "Fulfilment started.");

  let next_cart = controller.get_cart(user).await?;
  info!(cart_id = %next_cart.id, items = next_cart.item_count(), "Fresh cart ready.");

  for snapshot in registry.snapshots() {
    info!(breaker = %snapshot.name, state = %snapshot.state, "Breaker status.");
  }
  Ok(())
}
