// bazaar/src/flow/execution.rs

//! `Flow::run()`: executes steps in declaration order against one context.

use crate::error::{BazaarError, BazaarResult};
use crate::flow::context_data::ContextData;
use crate::flow::control::{FlowResult, StepControl};
use crate::flow::definition::Flow;
use tracing::{event, span, Instrument, Level};

impl<TData> Flow<TData>
where
  TData: 'static + Send + Sync,
{
  /// Runs every step in order.
  ///
  /// The first handler error aborts the run and is returned unchanged, so callers see
  /// exactly the `BazaarError` kind the failing step produced.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> BazaarResult<FlowResult> {
    let flow_span = span!(Level::DEBUG, "Flow::run", flow = self.name, num_steps = self.steps.len());
    self.run_steps(ctx_data).instrument(flow_span).await
  }

  async fn run_steps(&self, ctx_data: ContextData<TData>) -> BazaarResult<FlowResult> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_cond_fn) = &step_def.skip_if {
        if skip_cond_fn(ctx_data.clone()) {
          event!(Level::DEBUG, step_name, "Step skipped due to 'skip_if' condition.");
          continue;
        }
      }

      let handlers = match self.handlers.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          event!(Level::DEBUG, step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        _ => {
          event!(Level::ERROR, step_name, "Non-optional step has no handlers.");
          return Err(BazaarError::HandlerMissing {
            step_name: step_def.name.clone(),
          });
        }
      };

      let step_span = span!(Level::DEBUG, "flow_step", step_name, step_index = step_idx);
      for handler_fn in handlers {
        match handler_fn(ctx_data.clone()).instrument(step_span.clone()).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Stop) => {
            event!(Level::DEBUG, flow = self.name, step_name, "Flow stopped by handler.");
            return Ok(FlowResult::Stopped);
          }
          Err(e) => {
            // Expected rejections (bad input, unknown ids) are logged by the handler that raised them.
            event!(Level::DEBUG, flow = self.name, step_name, error = %e, "Step handler failed.");
            return Err(e);
          }
        }
      }
    }

    event!(Level::DEBUG, flow = self.name, "Flow completed.");
    Ok(FlowResult::Completed)
  }
}
