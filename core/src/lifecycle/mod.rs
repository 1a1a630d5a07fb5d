// bazaar/src/lifecycle/mod.rs

//! Order lifecycle: the cart operations, checkout, and the later status
//! transitions driven by fulfilment collaborators.

pub mod cart_flows;
pub mod checkout_flow;
pub mod common_steps;
pub mod contexts;
pub mod controller;
pub mod locks;

pub use contexts::CartServices;
pub use controller::CartController;
pub use locks::UserLocks;
