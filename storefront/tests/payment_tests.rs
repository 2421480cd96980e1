// storefront/tests/payment_tests.rs
mod common;

use common::*;
use std::sync::Arc;
use storefront::models::{OrderId, OrderStatus};
use storefront::orchestrator::{PaymentGateways, PaymentInitiation};
use storefront::payments::checksum::eximbay_fgkey;
use storefront::payments::portone::{PortOneConfig, PortOneGateway};
use storefront::payments::{Customer, PaymentHandle, PaymentMethod, PaymentReference};

fn initiation(order_id: OrderId, method: PaymentMethod) -> PaymentInitiation {
  PaymentInitiation {
    order_id,
    amount: 55_000,
    currency: "KRW".to_string(),
    customer: Customer {
      email: "kim@example.com".to_string(),
      name: "Minji Kim".to_string(),
      phone: None,
    },
    method,
  }
}

#[tokio::test]
async fn eximbay_form_is_signed_and_carries_reference() {
  let h = harness();
  let order = pending_order(&h).await;

  let session = h
    .orchestrator
    .initiate_payment(initiation(order.order_id, PaymentMethod::Eximbay))
    .await
    .unwrap();

  let reference: PaymentReference = session.payment_reference.parse().unwrap();
  assert_eq!(reference.order_id, order.order_id);

  let PaymentHandle::Form(form) = session.handle else {
    panic!("expected an Eximbay form handle");
  };
  assert_eq!(form.action_url, "https://api-test.eximbay.com/gateway/direct.html");
  assert_eq!(form.fields["ref"], "1000");
  assert_eq!(form.fields["param1"], session.payment_reference);
  assert_eq!(form.fields["returnurl"], CALLBACK_URL);
  assert_eq!(form.fields["fgkey"], eximbay_fgkey(SECRET, "1000", "KRW", "55000"));
}

#[tokio::test]
async fn portone_request_uses_reference_as_payment_id() {
  let h = harness();
  let order = pending_order(&h).await;
  let fixed = PaymentReference::new(order.order_id, 1_700_000_000_000);

  let session = h
    .orchestrator
    .initiate_payment_with_reference(initiation(order.order_id, PaymentMethod::PortOne), fixed)
    .await
    .unwrap();

  assert_eq!(session.payment_reference, "order_1000_1700000000000");
  let PaymentHandle::Sdk(request) = session.handle else {
    panic!("expected a PortOne SDK handle");
  };
  assert_eq!(request.payment_id, "order_1000_1700000000000");
  assert_eq!(request.currency, "CURRENCY_KRW");
  assert_eq!(request.order_name, "82Mobile Order #1000");
  assert_eq!(request.notice_urls, vec![CALLBACK_URL.to_string()]);
}

#[tokio::test]
async fn reference_for_another_order_is_invalid() {
  let h = harness();
  let order = pending_order(&h).await;
  let err = h
    .orchestrator
    .initiate_payment_with_reference(
      initiation(order.order_id, PaymentMethod::PortOne),
      PaymentReference::new(OrderId(7), 1),
    )
    .await
    .unwrap_err();
  assert_eq!(err.code(), "INVALID_INPUT");
}

#[tokio::test]
async fn zero_amount_is_invalid() {
  let h = harness();
  let order = pending_order(&h).await;
  let mut req = initiation(order.order_id, PaymentMethod::Eximbay);
  req.amount = 0;
  let err = h.orchestrator.initiate_payment(req).await.unwrap_err();
  assert_eq!(err.code(), "INVALID_INPUT");
}

#[tokio::test]
async fn provider_rejection_leaves_order_pending() {
  let h = harness();
  let order = pending_order(&h).await;
  let mut req = initiation(order.order_id, PaymentMethod::Eximbay);
  req.currency = "THB".to_string();

  let err = h.orchestrator.initiate_payment(req).await.unwrap_err();

  assert_eq!(err.code(), "PAYMENT_FAILED");
  assert_eq!(h.commerce.order(order.order_id).unwrap().status, OrderStatus::Pending);
  assert_eq!(h.commerce.update_calls(), 0);
}

#[tokio::test]
async fn unconfigured_portone_fails_initiation() {
  let h = harness_from(Default::default(), |deps| {
    deps.gateways = PaymentGateways::new().with(Arc::new(PortOneGateway::new(PortOneConfig::default())));
  });
  let order = pending_order(&h).await;

  let err = h
    .orchestrator
    .initiate_payment(initiation(order.order_id, PaymentMethod::PortOne))
    .await
    .unwrap_err();
  assert_eq!(err.code(), "PAYMENT_FAILED");
  assert_eq!(h.commerce.order(order.order_id).unwrap().status, OrderStatus::Pending);
}

#[tokio::test]
async fn disabled_method_fails_initiation() {
  let h = harness_from(Default::default(), |deps| {
    deps.gateways = PaymentGateways::new();
  });
  let order = pending_order(&h).await;
  let err = h
    .orchestrator
    .initiate_payment(initiation(order.order_id, PaymentMethod::Eximbay))
    .await
    .unwrap_err();
  assert_eq!(err.code(), "PAYMENT_FAILED");
}
