// storefront/src/pipelines/checkout_pipeline.rs

use crate::errors::AppError;
use crate::models::{NewOrder, NewOrderLine};
use crate::orchestrator::bounded;
use crate::pipelines::contexts::CheckoutCtxData;
use flow::{ContextData, Pipeline, PipelineControl, Workflows};
use tracing::{info, instrument, warn};

pub fn register_checkout_pipeline(registry: &Workflows<AppError>) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_checkout", false, None),
    ("build_order_request", false, None),
    ("create_order_record", false, None),
  ]);

  p.on_step("validate_checkout", validate_checkout);
  p.on_step("build_order_request", build_order_request);
  p.on_step("create_order_record", create_order_record);

  p.after_step("create_order_record", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let guard = ctx_data.read();
    if let Some(order) = &guard.created_order {
      if order.total < guard.cart.subtotal {
        warn!(
          order_id = %order.id,
          order_total = order.total,
          cart_subtotal = guard.cart.subtotal,
          "Commerce total is below the cart subtotal."
        );
      }
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(p);
  info!("Checkout pipeline registered.");
}

/// Rejects before any external call is made.
async fn validate_checkout(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let guard = ctx_data.read();

  if guard.cart.is_empty() {
    return Err(AppError::Validation("Cart is empty".to_string()));
  }
  if let Some(line) = guard.cart.items.iter().find(|l| l.quantity == 0) {
    return Err(AppError::Validation(format!(
      "Quantity for product {} must be at least 1",
      line.product_id
    )));
  }
  if let Some(field) = guard.billing.missing_field() {
    return Err(AppError::Validation(format!(
      "Billing information is incomplete: {} is required",
      field
    )));
  }
  if !guard.billing.email_looks_valid() {
    warn!("Invalid email format provided for checkout.");
    return Err(AppError::Validation("A valid billing email is required".to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn build_order_request(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let request = NewOrder {
    line_items: guard
      .cart
      .items
      .iter()
      .map(|l| NewOrderLine {
        product_id: l.product_id,
        name: l.name.clone(),
        quantity: l.quantity,
        unit_price: l.unit_price,
      })
      .collect(),
    billing: guard.billing.clone(),
    currency: guard.deps.settings.currency.clone(),
    payment_method: guard.payment_method,
  };
  guard.order_request = Some(request);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::create_order_record", skip_all)]
async fn create_order_record(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (deps, request) = {
    let guard = ctx_data.read();
    let request = guard
      .order_request
      .clone()
      .ok_or_else(|| AppError::Internal("Order request was not built".to_string()))?;
    (guard.deps.clone(), request)
  };

  let limit = deps.settings.external_timeout;
  let order = bounded("commerce service", limit, deps.commerce.create_order(&request))
    .await?
    .map_err(|e| {
      warn!(error = %e, "Commerce service did not create the order.");
      AppError::order_creation(e)
    })?;

  info!(order_id = %order.id, total = order.total, currency = %order.currency, "Order record created.");
  ctx_data.write().created_order = Some(order);
  Ok(PipelineControl::Continue)
}
