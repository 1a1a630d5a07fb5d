// bazaar/src/model/mod.rs

//! Order aggregate, its line items, remote product snapshots and the read views
//! handed back to callers.

pub mod line_item;
pub mod order;
pub mod snapshot;
pub mod view;

pub use line_item::LineItem;
pub use order::{Order, OrderStatus};
pub use snapshot::{ProductSnapshot, ProductStatus};
pub use view::{LineItemView, OrderView};

/// Identifier of a product owned by the remote product service.
/// A foreign reference only; never joined locally.
pub type ProductId = i64;
