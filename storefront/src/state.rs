// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::orchestrator::{Collaborators, Orchestrator, OrchestratorSettings, PaymentGateways};
use crate::payments::eximbay::{EximbayConfig, EximbayGateway};
use crate::payments::portone::{PortOneConfig, PortOneGateway};
use crate::services::{OrderLocks, WooCommerceClient, WooCommerceConfig};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub orchestrator: Arc<Orchestrator>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(orchestrator: Orchestrator, config: AppConfig) -> Self {
    Self {
      orchestrator: Arc::new(orchestrator),
      config: Arc::new(config),
    }
  }

  /// Wires the WooCommerce client and both payment gateways from `config`.
  pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
    let commerce = WooCommerceClient::new(WooCommerceConfig {
      base_url: config.commerce_api_url.clone(),
      host_header: config.commerce_host_header.clone(),
      consumer_key: config.wc_consumer_key.clone(),
      consumer_secret: config.wc_consumer_secret.clone(),
      timeout: config.external_timeout,
    })
    .map_err(|e| AppError::Config(e.to_string()))?;

    let callback_url = config.payment_callback_url();
    let gateways = PaymentGateways::new()
      .with(Arc::new(EximbayGateway::new(EximbayConfig {
        mid: config.eximbay_mid.clone(),
        secret_key: config.eximbay_secret_key.clone(),
        api_url: config.eximbay_api_url.clone(),
        callback_url: callback_url.clone(),
      })))
      .with(Arc::new(PortOneGateway::new(PortOneConfig {
        store_id: config.portone_store_id.clone(),
        channel_key: config.portone_channel_key.clone(),
        redirect_url: callback_url.clone(),
        notice_url: callback_url,
      })));

    let orchestrator = Orchestrator::new(Collaborators {
      commerce: Arc::new(commerce),
      gateways,
      locks: OrderLocks::new(),
      settings: OrchestratorSettings {
        currency: config.store_currency.clone(),
        external_timeout: config.external_timeout,
        retry_policy: config.payment_retry_policy,
        eximbay_secret: config.eximbay_secret_key.clone(),
      },
    });

    Ok(Self::new(orchestrator, config))
  }
}
