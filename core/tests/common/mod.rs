// core/tests/common/mod.rs
#![allow(dead_code)]

use flow::{ContextData, FlowError, Handler, PipelineControl};
use once_cell::sync::Lazy;
use tracing::Level;

/// Context used by the engine tests: records what ran, in order.
#[derive(Clone, Debug, Default)]
pub struct StepTrace {
  pub counter: i32,
  pub log: String,
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
  pub amount: u64,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(e: FlowError) -> Self {
    TestError::Flow(format!("{:?}", e))
  }
}

pub fn recording_handler(step_name: &'static str, text: &'static str) -> Handler<StepTrace, TestError> {
  Box::new(move |ctx: ContextData<StepTrace>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.log.push_str(text);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, counter = guard.counter, "executed");
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> Handler<StepTrace, TestError> {
  Box::new(move |ctx: ContextData<StepTrace>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
