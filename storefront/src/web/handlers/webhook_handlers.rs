// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::http::header::LOCATION;
use actix_web::{web, HttpResponse};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::models::{OrderStatus, ReconcileOutcome};
use crate::payments::RawNotification;
use crate::state::AppState;

fn outcome_body(outcome: &ReconcileOutcome) -> Value {
  match outcome {
    ReconcileOutcome::Applied { order_id, to, .. } => json!({
      "status": outcome.label(),
      "orderId": order_id,
      "orderStatus": to,
    }),
    ReconcileOutcome::Unchanged { order_id, status } => json!({
      "status": outcome.label(),
      "orderId": order_id,
      "orderStatus": status,
    }),
    ReconcileOutcome::Discarded(reason) => json!({
      "status": outcome.label(),
      "reason": reason.code(),
    }),
  }
}

/// Server-to-server notification. Every business outcome is acknowledged
/// with 200; only an unreachable commerce service asks for redelivery.
#[instrument(name = "handler::payment_webhook", skip(app_state, body), fields(payload_bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let payload = match serde_json::from_slice::<Value>(&body) {
    Ok(Value::Object(map)) => map,
    Ok(_) => return Err(AppError::Validation("Webhook body must be a JSON object".to_string())),
    Err(e) => return Err(AppError::Validation(format!("Webhook body is not valid JSON: {}", e))),
  };

  let outcome = app_state.orchestrator.reconcile(RawNotification::webhook(payload)).await?;
  if let ReconcileOutcome::Discarded(reason) = &outcome {
    warn!(reason = %reason, "Webhook acknowledged without changes.");
  }
  Ok(HttpResponse::Ok().json(outcome_body(&outcome)))
}

fn found(location: String) -> HttpResponse {
  HttpResponse::Found().insert_header((LOCATION, location)).finish()
}

/// The shopper's browser returning from the provider.
#[instrument(name = "handler::payment_redirect", skip_all)]
pub async fn payment_redirect_handler(
  app_state: web::Data<AppState>,
  query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
  match app_state
    .orchestrator
    .reconcile(RawNotification::redirect(query.into_inner()))
    .await
  {
    Ok(outcome) => match (outcome.order_id(), outcome.current_status()) {
      (Some(order_id), Some(OrderStatus::Processing | OrderStatus::Completed)) => {
        info!(%order_id, "Shopper returned after a successful payment.");
        found(format!("/order-complete?orderId={}", order_id))
      }
      (Some(order_id), _) => found(format!("/checkout?error=payment_failed&orderId={}", order_id)),
      (None, _) => found("/checkout?error=payment_failed".to_string()),
    },
    Err(e) => {
      error!(error = %e, "Redirect reconciliation failed.");
      found("/checkout?error=unknown".to_string())
    }
  }
}
