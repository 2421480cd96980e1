// storefront/src/pipelines/mod.rs

//! Pipelines behind the orchestrator, registered once per `Orchestrator`.

use crate::errors::AppError;
use flow::Workflows;

pub mod contexts;

pub mod checkout_pipeline;
pub mod payment_pipeline;
pub mod reconcile_pipeline;

pub fn register_all_pipelines(registry: &Workflows<AppError>) {
  tracing::info!("Registering storefront pipelines...");

  checkout_pipeline::register_checkout_pipeline(registry);
  payment_pipeline::register_payment_pipeline(registry);
  reconcile_pipeline::register_reconcile_pipeline(registry);

  tracing::info!("All storefront pipelines registered.");
}
