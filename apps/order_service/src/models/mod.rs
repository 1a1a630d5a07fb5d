// order_service/src/models/mod.rs

//! Database row shapes and their conversion into the core's domain types.

pub mod line_item_row;
pub mod order_row;

pub use line_item_row::LineItemRow;
pub use order_row::OrderRow;
