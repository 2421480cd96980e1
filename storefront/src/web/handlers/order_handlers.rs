// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::cart::CartSnapshot;
use crate::errors::AppError;
use crate::models::{Billing, CartLineItem, OrderId};
use crate::payments::PaymentMethod;
use crate::state::AppState;
use crate::web::handlers::Success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  #[serde(default)]
  pub items: Vec<CartLineItem>,
  pub billing: Billing,
  #[serde(default)]
  pub payment_method: PaymentMethod,
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, req_body),
  fields(lines = req_body.items.len(), method = %req_body.payment_method)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req_body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let CreateOrderRequest {
    items,
    billing,
    payment_method,
  } = req_body.into_inner();

  let summary = app_state
    .orchestrator
    .create_order(CartSnapshot::from_items(items), billing, payment_method)
    .await?;

  info!(order_id = %summary.order_id, total = summary.total, "Order created for checkout.");
  Ok(HttpResponse::Ok().json(Success::new(summary)))
}

#[instrument(name = "handler::get_order", skip(app_state))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orchestrator.get_order(OrderId(order_id.into_inner())).await?;
  Ok(HttpResponse::Ok().json(Success::new(json!({ "order": order }))))
}
