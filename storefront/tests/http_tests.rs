// storefront/tests/http_tests.rs
mod common;

use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::models::{OrderId, OrderStatus};
use storefront::services::CommerceError;
use storefront::state::AppState;
use storefront::web::configure_app_routes;

fn app_state(h: Harness) -> (AppState, Arc<storefront::services::InMemoryCommerce>) {
  let config = AppConfig::from_vars(|name| match name {
    "COMMERCE_API_URL" => Some("http://commerce.test/wp-json/wc/v3".to_string()),
    "EXIMBAY_SECRET_KEY" => Some(SECRET.to_string()),
    _ => None,
  })
  .unwrap();
  let commerce = h.commerce.clone();
  (AppState::new(h.orchestrator, config), commerce)
}

macro_rules! service {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn order_body() -> Value {
  json!({
    "items": [
      {"productId": 1, "name": "Korea eSIM 5GB", "slug": "korea-esim-5gb", "price": 25000, "quantity": 1},
      {"productId": 2, "name": "Japan eSIM 3GB", "slug": "japan-esim-3gb", "price": 15000, "quantity": 2,
       "attributes": {"validity": "7 days"}}
    ],
    "billing": {"email": "kim@example.com", "firstName": "Minji", "lastName": "Kim", "phone": ""},
    "paymentMethod": "eximbay"
  })
}

fn query_string(raw: &storefront::payments::RawNotification) -> String {
  raw
    .payload
    .iter()
    .map(|(k, v)| format!("{}={}", k, v.as_str().unwrap_or_default()))
    .collect::<Vec<_>>()
    .join("&")
}

#[actix_web::test]
async fn health_answers_ok() {
  let (state, _) = app_state(harness());
  let app = service!(state);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn create_order_returns_summary() {
  let (state, _) = app_state(harness());
  let app = service!(state);

  let req = test::TestRequest::post().uri("/api/v1/orders").set_json(order_body()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["orderId"], 1000);
  assert_eq!(body["total"], 55000);
  assert_eq!(body["status"], "pending");
}

#[actix_web::test]
async fn empty_cart_is_bad_request() {
  let (state, commerce) = app_state(harness());
  let app = service!(state);

  let mut payload = order_body();
  payload["items"] = json!([]);
  let req = test::TestRequest::post().uri("/api/v1/orders").set_json(payload).to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], false);
  assert_eq!(body["error"], "INVALID_INPUT");
  assert_eq!(commerce.create_calls(), 0);
}

#[actix_web::test]
async fn malformed_json_uses_error_envelope() {
  let (state, _) = app_state(harness());
  let app = service!(state);
  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("content-type", "application/json"))
    .set_payload("{\"items\": [")
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_web::test]
async fn unknown_order_is_not_found() {
  let (state, _) = app_state(harness());
  let app = service!(state);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/orders/4242").to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn initiate_payment_returns_handle() {
  let h = harness();
  let order = pending_order(&h).await;
  let (state, _) = app_state(h);
  let app = service!(state);

  let req = test::TestRequest::post()
    .uri("/api/v1/payment/initiate")
    .set_json(json!({
      "orderId": order.order_id,
      "amount": 55000,
      "customerEmail": "kim@example.com",
      "customerName": "Minji Kim",
      "paymentMethod": "portone"
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["handle"]["type"], "sdk");
  assert_eq!(body["handle"]["paymentId"], body["paymentReference"]);
  assert_eq!(body["handle"]["currency"], "CURRENCY_KRW");
}

#[actix_web::test]
async fn webhook_acknowledges_every_business_outcome() {
  let h = harness();
  let order = pending_order(&h).await;
  let (state, commerce) = app_state(h);
  let app = service!(state);

  let paid = Value::Object(eximbay_webhook(order.order_id, "0000").payload);
  let req = test::TestRequest::post().uri("/api/v1/payment/webhook").set_json(&paid).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body, json!({"status": "applied", "orderId": 1000, "orderStatus": "completed"}));

  let req = test::TestRequest::post().uri("/api/v1/payment/webhook").set_json(&paid).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "unchanged");

  let mut forged = eximbay_webhook(order.order_id, "1105").payload;
  forged.insert("fgkey".to_string(), json!("deadbeef"));
  let req = test::TestRequest::post()
    .uri("/api/v1/payment/webhook")
    .set_json(Value::Object(forged))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({"status": "discarded", "reason": "INVALID_CHECKSUM"}));

  assert_eq!(commerce.order(OrderId(1000)).unwrap().status, OrderStatus::Completed);
}

#[actix_web::test]
async fn webhook_rejects_non_object_bodies() {
  let (state, _) = app_state(harness());
  let app = service!(state);
  for payload in ["[1, 2, 3]", "not json", ""] {
    let req = test::TestRequest::post()
      .uri("/api/v1/payment/webhook")
      .insert_header(("content-type", "application/json"))
      .set_payload(payload)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {:?}", payload);
  }
}

#[actix_web::test]
async fn webhook_asks_for_redelivery_when_commerce_is_down() {
  let h = harness();
  let order = pending_order(&h).await;
  let (state, commerce) = app_state(h);
  let app = service!(state);
  commerce.fail_with(Some(CommerceError::Unreachable("connection refused".to_string())));

  let req = test::TestRequest::post()
    .uri("/api/v1/payment/webhook")
    .set_json(Value::Object(eximbay_webhook(order.order_id, "0000").payload))
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[actix_web::test]
async fn redirect_sends_shopper_to_order_complete() {
  let h = harness();
  let order = pending_order(&h).await;
  let (state, commerce) = app_state(h);
  let app = service!(state);

  let uri = format!("/api/v1/payment/webhook?{}", query_string(&eximbay_redirect(order.order_id, "0000")));
  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

  assert_eq!(resp.status(), StatusCode::FOUND);
  assert_eq!(resp.headers().get(LOCATION).unwrap(), "/order-complete?orderId=1000");
  assert_eq!(commerce.order(order.order_id).unwrap().status, OrderStatus::Processing);
}

#[actix_web::test]
async fn failed_redirect_returns_shopper_to_checkout() {
  let h = harness();
  let order = pending_order(&h).await;
  let (state, commerce) = app_state(h);
  let app = service!(state);

  let payment_id = reference(order.order_id, 1_700_000_000_000);
  let uri = format!("/api/v1/payment/webhook?paymentId={}&code=FAILURE_TYPE_PG", payment_id);
  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

  assert_eq!(resp.status(), StatusCode::FOUND);
  assert_eq!(
    resp.headers().get(LOCATION).unwrap(),
    "/checkout?error=payment_failed&orderId=1000"
  );
  assert_eq!(commerce.order(order.order_id).unwrap().status, OrderStatus::Pending);
}
