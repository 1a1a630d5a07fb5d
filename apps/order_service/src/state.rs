// order_service/src/state.rs
use crate::config::AppConfig;
use bazaar::{BreakerRegistry, CartController};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub cart: Arc<CartController>,
  pub breakers: Arc<BreakerRegistry>, // Read by the health endpoint
  pub config: Arc<AppConfig>,
}
