// order_service/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const CALLER_ROLE_HEADER: &str = "X-Caller-Role";

/// Who is calling. Shoppers are the default; fulfilment is a trusted collaborator
/// that drives orders through their lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
  Customer,
  Fulfillment,
}

impl CallerRole {
  fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "customer" => Some(CallerRole::Customer),
      "fulfillment" => Some(CallerRole::Fulfillment),
      _ => None,
    }
  }
}

/// Caller identity, taken from the `X-User-ID` and `X-Caller-Role` headers set by
/// the upstream authentication gateway.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: CallerRole,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let headers = req.headers();
    let user_id = headers
      .get(USER_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

    let Some(user_id) = user_id else {
      warn!(path = %req.path(), "Missing or invalid X-User-ID header.");
      return ready(Err(AppError::Auth(format!(
        "A valid {} header is required",
        USER_ID_HEADER
      ))));
    };

    let role = match headers.get(CALLER_ROLE_HEADER) {
      None => Some(CallerRole::Customer),
      Some(value) => value.to_str().ok().and_then(CallerRole::parse),
    };

    match role {
      Some(role) => ready(Ok(AuthenticatedUser { user_id, role })),
      None => {
        warn!(path = %req.path(), "Unrecognised X-Caller-Role header.");
        ready(Err(AppError::Auth(format!(
          "{} must be 'customer' or 'fulfillment'",
          CALLER_ROLE_HEADER
        ))))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roles_parse_case_insensitively() {
    assert_eq!(CallerRole::parse("Fulfillment"), Some(CallerRole::Fulfillment));
    assert_eq!(CallerRole::parse(" customer "), Some(CallerRole::Customer));
    assert_eq!(CallerRole::parse("admin"), None);
  }
}
