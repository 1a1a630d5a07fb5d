// order_service/src/config.rs

use crate::errors::{AppError, Result};
use bazaar::{BreakerConfig, ResilienceConfig, PRODUCT_SERVICE};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  /// Base address of the product-owning service, e.g. `http://products:8081`.
  pub product_service_url: String,
  pub product_service_timeout: Duration,

  pub breaker: BreakerConfig,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let required = |name: &str| {
      lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)))
    };
    let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = var_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var::<u16>("SERVER_PORT", &var_or("SERVER_PORT", "8080"))?;
    let database_url = required("DATABASE_URL")?;
    let database_max_connections =
      parse_var::<u32>("DATABASE_MAX_CONNECTIONS", &var_or("DATABASE_MAX_CONNECTIONS", "10"))?;
    let run_migrations = parse_var::<bool>("RUN_MIGRATIONS", &var_or("RUN_MIGRATIONS", "true"))?;

    let product_service_url = required("PRODUCT_SERVICE_URL")?.trim_end_matches('/').to_string();
    let product_service_timeout = Duration::from_millis(parse_var::<u64>(
      "PRODUCT_SERVICE_TIMEOUT_MS",
      &var_or("PRODUCT_SERVICE_TIMEOUT_MS", "2000"),
    )?);

    let failure_rate_threshold = parse_var::<u8>("BREAKER_FAILURE_RATE", &var_or("BREAKER_FAILURE_RATE", "50"))?;
    if failure_rate_threshold == 0 || failure_rate_threshold > 100 {
      return Err(AppError::Config(format!(
        "Invalid BREAKER_FAILURE_RATE {}: must be between 1 and 100",
        failure_rate_threshold
      )));
    }
    let breaker = BreakerConfig {
      failure_rate_threshold,
      minimum_calls: parse_var::<u32>("BREAKER_MINIMUM_CALLS", &var_or("BREAKER_MINIMUM_CALLS", "5"))?,
      window: Duration::from_secs(parse_var::<u64>("BREAKER_WINDOW_SECS", &var_or("BREAKER_WINDOW_SECS", "30"))?),
      open_duration: Duration::from_secs(parse_var::<u64>("BREAKER_OPEN_SECS", &var_or("BREAKER_OPEN_SECS", "15"))?),
    };

    let log_format = var_or("LOG_FORMAT", "pretty").parse::<LogFormat>()?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      product_service_url,
      product_service_timeout,
      breaker,
      log_format,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  pub fn product_resilience(&self) -> ResilienceConfig {
    ResilienceConfig {
      dependency: PRODUCT_SERVICE.to_string(),
      call_timeout: self.product_service_timeout,
    }
  }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  const REQUIRED: [(&str, &str); 2] = [
    ("DATABASE_URL", "postgres://localhost/orders"),
    ("PRODUCT_SERVICE_URL", "http://products:8081/"),
  ];

  #[test]
  fn applies_defaults() {
    let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();
    assert_eq!(config.server_address(), "127.0.0.1:8080");
    assert_eq!(config.database_max_connections, 10);
    assert!(config.run_migrations);
    assert_eq!(config.product_service_url, "http://products:8081");
    assert_eq!(config.product_service_timeout, Duration::from_millis(2000));
    assert_eq!(config.breaker, BreakerConfig::default());
    assert_eq!(config.log_format, LogFormat::Pretty);
    assert_eq!(config.product_resilience().dependency, "product-service");
  }

  #[test]
  fn missing_database_url_is_a_config_error() {
    let err = AppConfig::from_lookup(lookup(&[("PRODUCT_SERVICE_URL", "http://p")])).unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("DATABASE_URL")));
  }

  #[test]
  fn rejects_malformed_values() {
    for (name, value) in [
      ("SERVER_PORT", "eighty"),
      ("BREAKER_FAILURE_RATE", "0"),
      ("BREAKER_FAILURE_RATE", "150"),
      ("RUN_MIGRATIONS", "maybe"),
      ("LOG_FORMAT", "xml"),
    ] {
      let mut vars = REQUIRED.to_vec();
      vars.push((name, value));
      assert!(AppConfig::from_lookup(lookup(&vars)).is_err(), "{}={}", name, value);
    }
  }

  #[test]
  fn reads_overrides() {
    let mut vars = REQUIRED.to_vec();
    vars.extend([
      ("SERVER_PORT", "9090"),
      ("PRODUCT_SERVICE_TIMEOUT_MS", "750"),
      ("BREAKER_MINIMUM_CALLS", "20"),
      ("BREAKER_OPEN_SECS", "60"),
      ("LOG_FORMAT", "json"),
    ]);
    let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
    assert_eq!(config.server_port, 9090);
    assert_eq!(config.product_service_timeout, Duration::from_millis(750));
    assert_eq!(config.breaker.minimum_calls, 20);
    assert_eq!(config.breaker.open_duration, Duration::from_secs(60));
    assert_eq!(config.log_format, LogFormat::Json);
  }
}
