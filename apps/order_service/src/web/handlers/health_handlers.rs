// order_service/src/web/handlers/health_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::state::AppState;

/// Always 200 while the process serves requests; an open breaker only marks the
/// service as degraded.
pub async fn health_handler(app_state: web::Data<AppState>) -> HttpResponse {
  let status = if app_state.breakers.all_closed() { "ok" } else { "degraded" };
  HttpResponse::Ok().json(json!({
    "status": status,
    "productService": app_state.config.product_service_url,
    "breakers": app_state.breakers.snapshots(),
  }))
}
