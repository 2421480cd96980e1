// storefront/src/pipelines/payment_pipeline.rs

use crate::errors::AppError;
use crate::orchestrator::bounded;
use crate::payments::{PaymentReference, PaymentRequest};
use crate::pipelines::contexts::PaymentCtxData;
use flow::{ContextData, Pipeline, PipelineControl, Workflows};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub fn register_payment_pipeline(registry: &Workflows<AppError>) {
  let mut p = Pipeline::<PaymentCtxData, AppError>::new(&[
    ("validate_payment_request", false, None),
    (
      "assign_payment_reference",
      false,
      Some(Arc::new(|d: &PaymentCtxData| d.reference.is_some())),
    ),
    ("request_provider_handle", false, None),
  ]);

  p.on_step("validate_payment_request", validate_payment_request);
  p.on_step("assign_payment_reference", |ctx_data: ContextData<PaymentCtxData>| async move {
    ctx_data.update(|d| d.reference = Some(PaymentReference::now(d.order_id)));
    Ok::<_, AppError>(PipelineControl::Continue)
  });
  p.on_step("request_provider_handle", request_provider_handle);

  registry.register_pipeline(p);
  info!("Payment initiation pipeline registered.");
}

async fn validate_payment_request(ctx_data: ContextData<PaymentCtxData>) -> Result<PipelineControl, AppError> {
  let guard = ctx_data.read();
  if guard.amount == 0 {
    return Err(AppError::Validation("Payment amount must be positive".to_string()));
  }
  if guard.currency.trim().is_empty() {
    return Err(AppError::Validation("Currency is required".to_string()));
  }
  if guard.customer.email.trim().is_empty() {
    return Err(AppError::Validation("Customer email is required".to_string()));
  }
  if let Some(reference) = &guard.reference {
    if reference.order_id != guard.order_id {
      return Err(AppError::Validation(format!(
        "Payment reference {} belongs to another order",
        reference
      )));
    }
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "payment::request_provider_handle", skip_all)]
async fn request_provider_handle(ctx_data: ContextData<PaymentCtxData>) -> Result<PipelineControl, AppError> {
  let (deps, request, method) = {
    let guard = ctx_data.read();
    let reference = guard
      .reference
      .ok_or_else(|| AppError::Internal("Payment reference was not assigned".to_string()))?;
    let request = PaymentRequest {
      order_id: guard.order_id,
      amount: guard.amount,
      currency: guard.currency.clone(),
      customer: guard.customer.clone(),
      reference,
    };
    (guard.deps.clone(), request, guard.method)
  };

  let gateway = deps.gateways.get(method)?;
  let limit = deps.settings.external_timeout;
  let handle = bounded("payment provider", limit, gateway.initiate(&request))
    .await?
    .map_err(|e| {
      // The order stays pending; only a provider webhook may fail it.
      warn!(order_id = %request.order_id, error = %e, "Payment initiation failed.");
      AppError::Payment(e)
    })?;

  info!(order_id = %request.order_id, payment_reference = %request.reference, "Payment handle issued.");
  ctx_data.write().handle = Some(handle);
  Ok(PipelineControl::Continue)
}
