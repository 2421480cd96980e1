// storefront/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{order_handlers, payment_handlers, webhook_handlers};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed JSON bodies answer with the same error envelope as everything else.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .app_data(json_config())
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      .service(
        web::scope("/payment")
          .route("/initiate", web::post().to(payment_handlers::initiate_payment_handler))
          // Providers post webhooks here; browsers come back here with a GET.
          .route("/webhook", web::post().to(webhook_handlers::payment_webhook_handler))
          .route("/webhook", web::get().to(webhook_handlers::payment_redirect_handler)),
      ),
  );
}
