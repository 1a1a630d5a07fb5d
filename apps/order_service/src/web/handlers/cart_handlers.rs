// order_service/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::ProductId;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::Result;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
  pub product_id: ProductId,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse> {
  let view = app_state.cart.get_cart(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(
  name = "handler::add_item",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = payload.product_id, quantity = payload.quantity)
)]
pub async fn add_item_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AddItemPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let view = app_state
    .cart
    .add_item(auth_user.user_id, payload.product_id, payload.quantity)
    .await?;
  info!(items = view.item_count(), total = %view.total_price, "Item added to cart.");
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(
  name = "handler::update_item",
  skip(app_state, path, payload, auth_user),
  fields(user_id = %auth_user.user_id, item_id = %path, quantity = payload.quantity)
)]
pub async fn update_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateQuantityPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let view = app_state
    .cart
    .update_item_quantity(auth_user.user_id, path.into_inner(), payload.quantity)
    .await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(
  name = "handler::remove_item",
  skip(app_state, path, auth_user),
  fields(user_id = %auth_user.user_id, item_id = %path)
)]
pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let view = app_state.cart.remove_item(auth_user.user_id, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::clear_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse> {
  app_state.cart.clear_cart(auth_user.user_id).await?;
  Ok(HttpResponse::NoContent().finish())
}
