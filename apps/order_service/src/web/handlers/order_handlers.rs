// order_service/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::OrderStatus;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, CallerRole};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
  pub delivery_address: String,
}

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
  pub status: String,
}

#[instrument(name = "handler::checkout", skip(app_state, payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let order = app_state
    .cart
    .checkout(auth_user.user_id, &payload.delivery_address)
    .await?;
  info!(order_id = %order.id, total = %order.total_price, "Checkout completed.");
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let orders = app_state.cart.list_orders(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, path, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let order = app_state.cart.get_order(auth_user.user_id, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

/// Fulfilment may move any order along its lifecycle. Customers may only cancel
/// their own orders; another user's order answers 404.
#[instrument(
  name = "handler::transition_order",
  skip(app_state, path, payload, auth_user),
  fields(user_id = %auth_user.user_id, role = ?auth_user.role, order_id = %path, target = %payload.status)
)]
pub async fn transition_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<StatusPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let target = payload
    .status
    .parse::<OrderStatus>()
    .map_err(|e| AppError::Validation(e.to_string()))?;
  let order_id = path.into_inner();

  let order = match (auth_user.role, target) {
    (CallerRole::Fulfillment, _) => app_state.cart.transition_order(order_id, target).await?,
    (CallerRole::Customer, OrderStatus::Canceled) => app_state.cart.cancel_order(auth_user.user_id, order_id).await?,
    (CallerRole::Customer, _) => {
      warn!("Customer attempted a fulfilment transition.");
      return Err(AppError::Forbidden(format!(
        "Customers may only cancel their orders, not move them to {}",
        target
      )));
    }
  };
  Ok(HttpResponse::Ok().json(order))
}
