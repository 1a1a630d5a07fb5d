// bazaar/src/flow/definition.rs

//! `Flow<TData>` declaration: ordered step definitions plus their handlers.

use crate::error::BazaarResult;
use crate::flow::context_data::ContextData;
use crate::flow::control::StepControl;
use crate::flow::step::{SkipCondition, StepDef, StepHandler};
use std::collections::HashMap;
use std::future::Future;

/// An ordered, named sequence of steps over a shared `ContextData<TData>`.
///
/// Flows are built once (when the controller is constructed) and run many times;
/// they hold no per-run state.
pub struct Flow<TData>
where
  TData: 'static + Send + Sync,
{
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, Vec<StepHandler<TData>>>,
}

impl<TData> Flow<TData>
where
  TData: 'static + Send + Sync,
{
  /// Declares a flow from `(step_name, optional, skip_if)` tuples.
  pub fn new(name: &'static str, step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_cond_opt)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_cond_opt.clone(),
      })
      .collect();

    Self {
      name,
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  // Handlers for unknown steps are a wiring mistake, caught when the flow is built.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "Flow setup error: step '{}' is not declared in flow '{}'.",
        step_name, self.name
      );
    }
  }

  /// Registers a handler for a declared step. Several handlers on one step run in
  /// registration order.
  pub fn on<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = BazaarResult<StepControl>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: StepHandler<TData> = Box::new(move |ctx_data| Box::pin(handler_fn(ctx_data)));
    self.handlers.entry(step_name.to_string()).or_default().push(handler);
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    self.ensure_step_exists(step_name);
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.skip_if = skip_if;
    }
  }
}

impl<TData> std::fmt::Debug for Flow<TData>
where
  TData: 'static + Send + Sync,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Flow")
      .field("name", &self.name)
      .field("steps", &self.steps)
      .finish()
  }
}
