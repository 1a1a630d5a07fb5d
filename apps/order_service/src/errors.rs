// order_service/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bazaar::BazaarError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Invalid State: {0}")]
  InvalidState(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Service Unavailable: {0}")]
  Unavailable(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Stable machine-readable code sent alongside the message.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "VALIDATION",
      AppError::Auth(_) => "UNAUTHORIZED",
      AppError::Forbidden(_) => "FORBIDDEN",
      AppError::NotFound(_) => "NOT_FOUND",
      AppError::InvalidState(_) => "INVALID_STATE",
      AppError::Conflict(_) => "CONFLICT",
      AppError::Unavailable(_) => "SERVICE_UNAVAILABLE",
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => "INTERNAL",
    }
  }
}

impl From<BazaarError> for AppError {
  fn from(err: BazaarError) -> Self {
    match err {
      BazaarError::NotFound { .. } => AppError::NotFound(err.to_string()),
      BazaarError::InvalidState(m) => AppError::InvalidState(m),
      BazaarError::Conflict(m) => AppError::Conflict(m),
      BazaarError::Unavailable { .. } => AppError::Unavailable(err.to_string()),
      BazaarError::Storage { source } => match source.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(other) => AppError::Internal(format!("Storage operation failed: {:#}", other)),
      },
      BazaarError::HandlerMissing { .. } | BazaarError::Internal(_) => AppError::Internal(err.to_string()),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(format!("{:#}", err)),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Internal details stay in the logs.
    let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
      tracing::error!(application_error = %self, "Responding with internal error");
      "An internal error occurred".to_string()
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
      self.to_string()
    };
    HttpResponse::build(status).json(json!({ "error": message, "code": self.code() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
