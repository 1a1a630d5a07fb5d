// order_service/src/services/product_client.rs

//! HTTP client for the product-owning service.

use async_trait::async_trait;
use bazaar::{ProductId, ProductResolver, ProductSnapshot, ProductStatus, ResolveError};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// Body of `GET {base}/api/v1/products/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductResponse {
  id: ProductId,
  unit_price: Decimal,
  name: String,
  status: String,
}

impl From<ProductResponse> for ProductSnapshot {
  fn from(body: ProductResponse) -> Self {
    ProductSnapshot {
      id: body.id,
      unit_price: body.unit_price,
      display_name: body.name,
      availability: ProductStatus::from_remote(&body.status),
    }
  }
}

/// Performs exactly one request per `resolve`; timeouts and breaking are applied by
/// the caller's `GuardedResolver`.
#[derive(Debug, Clone)]
pub struct HttpProductClient {
  client: Client,
  base_url: String,
}

impl HttpProductClient {
  /// `base_url` is the service root, e.g. `http://product-service:8081`.
  pub fn new(base_url: &str) -> Self {
    Self::with_client(Client::new(), base_url)
  }

  pub fn with_client(client: Client, base_url: &str) -> Self {
    Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }

  fn product_url(&self, product_id: ProductId) -> String {
    format!("{}/api/v1/products/{}", self.base_url, product_id)
  }
}

#[async_trait]
impl ProductResolver for HttpProductClient {
  async fn resolve(&self, product_id: ProductId) -> Result<ProductSnapshot, ResolveError> {
    let url = self.product_url(product_id);
    debug!(%url, "Fetching product snapshot.");

    let response = self.client.get(&url).send().await.map_err(ResolveError::transport)?;

    match response.status() {
      StatusCode::NOT_FOUND => return Err(ResolveError::NotFound(product_id)),
      status if !status.is_success() => {
        return Err(ResolveError::transport(anyhow::anyhow!(
          "product service answered HTTP {} for product {}",
          status,
          product_id
        )))
      }
      _ => {}
    }

    let body: ProductResponse = response.json().await.map_err(ResolveError::transport)?;
    if body.id != product_id {
      return Err(ResolveError::transport(anyhow::anyhow!(
        "product service returned product {} when asked for {}",
        body.id,
        product_id
      )));
    }
    Ok(body.into())
  }
}
