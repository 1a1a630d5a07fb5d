// order_service/src/services/mod.rs

pub mod product_client;

pub use product_client::HttpProductClient;
