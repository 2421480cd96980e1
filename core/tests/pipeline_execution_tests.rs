// core/tests/pipeline_execution_tests.rs
mod common;

use common::*;
use flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use std::sync::Arc;

#[tokio::test]
async fn steps_run_in_declared_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[
    ("validate", false, None),
    ("create_order", false, None),
    ("begin_charge", false, None),
  ]);
  pipeline.on_step_boxed("validate", recording_handler("validate", " V"));
  pipeline.on_step_boxed("create_order", recording_handler("create_order", " O"));
  pipeline.on_step_boxed("begin_charge", recording_handler("begin_charge", " C"));

  let ctx = ContextData::new(StepTrace::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.log, " V O C");
  assert_eq!(guard.steps_executed, vec!["validate", "create_order", "begin_charge"]);
}

#[tokio::test]
async fn stop_ends_the_run_without_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[
    ("classify", false, None),
    ("verify", false, None),
    ("apply", false, None),
  ]);
  pipeline.on_step_boxed("classify", recording_handler("classify", "A"));
  pipeline.on_step_boxed("verify", recording_handler("verify", "B"));
  pipeline.on_step_boxed("apply", recording_handler("apply", "C"));

  let ctx = ContextData::new(StepTrace {
    stop_at: Some("verify".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["classify", "verify"]);
}

#[tokio::test]
async fn handler_error_is_returned_unchanged() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[
    ("good", false, None),
    ("bad", false, None),
    ("never", false, None),
  ]);
  pipeline.on_step_boxed("good", recording_handler("good", "G"));
  pipeline.on_step_boxed("bad", failing_handler("bad", "upstream rejected"));
  pipeline.on_step_boxed("never", recording_handler("never", "N"));

  let ctx = ContextData::new(StepTrace::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("upstream rejected".to_string()));
  assert_eq!(ctx.read().steps_executed, vec!["good", "bad"]);
}

#[tokio::test]
async fn skip_condition_sees_current_data() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[
    ("first", false, None),
    ("only_for_free_orders", false, Some(Arc::new(|t: &StepTrace| t.amount > 0))),
    ("last", false, None),
  ]);
  pipeline.on_step_boxed("first", recording_handler("first", "1"));
  pipeline.on_step_boxed("only_for_free_orders", recording_handler("only_for_free_orders", "F"));
  pipeline.on_step_boxed("last", recording_handler("last", "3"));

  let ctx = ContextData::new(StepTrace {
    amount: 55_000,
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().log, "13");

  let free = ContextData::new(StepTrace::default());
  pipeline.run(free.clone()).await.unwrap();
  assert_eq!(free.read().log, "1F3");
}

#[tokio::test]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[("main", false, None)]);
  pipeline.after_step("main", |ctx: ContextData<StepTrace>| async move {
    ctx.update(|t| t.log.push_str("after;"));
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.on_step("main", |ctx: ContextData<StepTrace>| async move {
    ctx.update(|t| t.log.push_str("on;"));
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.before_step("main", |ctx: ContextData<StepTrace>| async move {
    ctx.update(|t| t.log.push_str("before;"));
    Ok::<_, FlowError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(StepTrace::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().log, "before;on;after;");
}

#[tokio::test]
async fn stop_in_before_phase_skips_on_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[("guarded", false, None)]);
  pipeline.before_step("guarded", |_ctx: ContextData<StepTrace>| async move {
    Ok::<_, TestError>(PipelineControl::Stop)
  });
  pipeline.on_step_boxed("guarded", recording_handler("guarded", "X"));

  let ctx = ContextData::new(StepTrace::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert!(ctx.read().steps_executed.is_empty());
}

#[tokio::test]
async fn optional_step_without_handlers_is_passed_over() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[("notify", true, None), ("done", false, None)]);
  pipeline.on_step_boxed("done", recording_handler("done", "D"));

  let ctx = ContextData::new(StepTrace::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["done"]);
}

#[test]
#[should_panic(expected = "Step not found: typo")]
fn attaching_to_unknown_step_panics() {
  let mut pipeline = Pipeline::<StepTrace, TestError>::new(&[("real", false, None)]);
  pipeline.on_step_boxed("typo", recording_handler("typo", ""));
}

#[test]
fn step_names_follow_declaration() {
  let pipeline = Pipeline::<StepTrace, TestError>::new(&[("a", false, None), ("b", true, None)]);
  assert_eq!(pipeline.step_names(), vec!["a", "b"]);
}
