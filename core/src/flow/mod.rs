// bazaar/src/flow/mod.rs

//! A small step engine. Each cart operation is declared as an ordered list of
//! named steps whose async handlers share one `ContextData<T>`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{FlowResult, StepControl};
pub use definition::Flow;
pub use step::{SkipCondition, StepDef, StepHandler};
