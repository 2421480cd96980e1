// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::OrderId;
use crate::orchestrator::PaymentInitiation;
use crate::payments::{Customer, PaymentMethod};
use crate::state::AppState;
use crate::web::handlers::Success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
  pub order_id: OrderId,
  pub amount: u64,
  /// Store currency when absent.
  pub currency: Option<String>,
  pub customer_email: String,
  #[serde(default)]
  pub customer_name: String,
  pub customer_phone: Option<String>,
  #[serde(default)]
  pub payment_method: PaymentMethod,
}

#[instrument(
  name = "handler::initiate_payment",
  skip(app_state, req_body),
  fields(order_id = %req_body.order_id, method = %req_body.payment_method)
)]
pub async fn initiate_payment_handler(
  app_state: web::Data<AppState>,
  req_body: web::Json<InitiatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
  let req = req_body.into_inner();
  let currency = req
    .currency
    .map(|c| c.trim().to_ascii_uppercase())
    .filter(|c| !c.is_empty())
    .unwrap_or_else(|| app_state.orchestrator.settings().currency.clone());

  let session = app_state
    .orchestrator
    .initiate_payment(PaymentInitiation {
      order_id: req.order_id,
      amount: req.amount,
      currency,
      customer: Customer {
        email: req.customer_email,
        name: req.customer_name,
        phone: req.customer_phone,
      },
      method: req.payment_method,
    })
    .await?;

  Ok(HttpResponse::Ok().json(Success::new(session)))
}
