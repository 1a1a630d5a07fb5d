// bazaar/src/flow/control.rs

//! Signals a step handler returns, and the outcome of a whole flow run.

/// Returned by a step handler to continue or halt the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// Halt immediately. Remaining handlers and steps are not run.
  /// Used when there is nothing left to do (e.g. clearing a cart that was never created).
  Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowResult {
  Completed,
  Stopped,
}
