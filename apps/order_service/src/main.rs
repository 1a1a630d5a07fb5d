// order_service/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat};
use crate::db::PgOrderStore;
use crate::errors::AppError;
use crate::services::HttpProductClient;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use bazaar::{BreakerRegistry, CartController, GuardedResolver};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

async fn run(app_config: Arc<AppConfig>) -> Result<(), AppError> {
  let pool = db::connect(&app_config).await?;
  let store = Arc::new(PgOrderStore::new(pool));

  let breakers = Arc::new(BreakerRegistry::new(app_config.breaker.clone()));
  let product_client = Arc::new(HttpProductClient::new(&app_config.product_service_url));
  let products = Arc::new(GuardedResolver::new(
    product_client,
    &breakers,
    app_config.product_resilience(),
  ));
  let cart = Arc::new(CartController::new(store, products));

  let app_state = AppState {
    cart,
    breakers,
    config: app_config.clone(),
  };

  let server_address = app_config.server_address();
  tracing::info!(%server_address, product_service = %app_config.product_service_url, "Starting order service.");

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .map_err(|e| AppError::Config(format!("Cannot bind {}: {}", server_address, e)))?
  .run()
  .await
  .map_err(|e| AppError::Internal(format!("Server terminated: {}", e)))
}

#[actix_web::main]
async fn main() -> ExitCode {
  // The log format is itself configuration; peek at it before the full load so
  // config errors are reported through the chosen subscriber.
  let log_format = std::env::var("LOG_FORMAT")
    .ok()
    .and_then(|raw| raw.parse::<LogFormat>().ok())
    .unwrap_or(LogFormat::Pretty);
  init_tracing(log_format);

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return ExitCode::FAILURE;
    }
  };

  match run(app_config).await {
    Ok(()) => {
      tracing::info!("Order service stopped.");
      ExitCode::SUCCESS
    }
    Err(e) => {
      tracing::error!(error = %e, "Order service exited with an error.");
      ExitCode::FAILURE
    }
  }
}
