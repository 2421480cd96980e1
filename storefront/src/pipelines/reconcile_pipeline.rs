// storefront/src/pipelines/reconcile_pipeline.rs

//! classify → verify checksum → resolve order id → apply transition.
//!
//! Any notification that cannot be trusted or placed ends the run with a
//! `Discarded` outcome and no order change. The transition step holds the
//! order's lock across read, decide and write, so two notifications for one
//! order cannot interleave.

use crate::errors::AppError;
use crate::models::{DiscardReason, ReconcileOutcome, RetryPolicy, Transition};
use crate::orchestrator::bounded;
use crate::payments::checksum::verify_eximbay_fgkey;
use crate::payments::{classify, ClassifyError, ProviderNotification};
use crate::pipelines::contexts::ReconcileCtxData;
use flow::{ContextData, Pipeline, PipelineControl, Workflows};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub fn register_reconcile_pipeline(registry: &Workflows<AppError>) {
  let mut p = Pipeline::<ReconcileCtxData, AppError>::new(&[
    ("classify_notification", false, None),
    (
      "verify_checksum",
      false,
      Some(Arc::new(|d: &ReconcileCtxData| {
        !matches!(d.notification, Some(ProviderNotification::Eximbay(_)))
      })),
    ),
    ("resolve_order_id", false, None),
    ("apply_status_transition", false, None),
  ]);

  p.on_step("classify_notification", classify_notification);
  p.on_step("verify_checksum", verify_checksum);
  p.on_step("resolve_order_id", resolve_order_id);
  p.on_step("apply_status_transition", apply_status_transition);

  registry.register_pipeline(p);
  info!("Reconciliation pipeline registered.");
}

fn discard(ctx_data: &ContextData<ReconcileCtxData>, reason: DiscardReason) -> Result<PipelineControl, AppError> {
  ctx_data.write().outcome = Some(ReconcileOutcome::Discarded(reason));
  Ok(PipelineControl::Stop)
}

async fn classify_notification(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let classified = classify(&ctx_data.read().raw);
  match classified {
    Ok(notification) => {
      debug!(provider = %notification.provider(), "Notification classified.");
      ctx_data.write().notification = Some(notification);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      warn!(error = %e, "Notification discarded.");
      let reason = match e {
        ClassifyError::UnknownProvider => DiscardReason::UnknownProvider,
        ClassifyError::Malformed { .. } => DiscardReason::Malformed,
      };
      discard(&ctx_data, reason)
    }
  }
}

/// Eximbay only. Every field the checksum covers must be present.
async fn verify_checksum(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let verified = {
    let guard = ctx_data.read();
    match &guard.notification {
      Some(ProviderNotification::Eximbay(n)) => match (&n.cur, &n.amt, &n.fgkey) {
        (Some(cur), Some(amt), Some(fgkey)) => {
          verify_eximbay_fgkey(&guard.deps.settings.eximbay_secret, &n.reference, cur, amt, fgkey)
        }
        _ => false,
      },
      _ => true,
    }
  };

  if verified {
    return Ok(PipelineControl::Continue);
  }
  warn!(target: "audit", "Payment notification failed checksum verification, discarded.");
  discard(&ctx_data, DiscardReason::InvalidChecksum)
}

async fn resolve_order_id(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let resolved = match &ctx_data.read().notification {
    Some(n) => n.order_id(),
    None => return Err(AppError::Internal("Notification was not classified".to_string())),
  };
  match resolved {
    Ok(order_id) => {
      ctx_data.write().order_id = Some(order_id);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      warn!(error = %e, "No order id in notification, discarded.");
      discard(&ctx_data, DiscardReason::MissingOrderId)
    }
  }
}

/// Whole-unit amounts compare equal regardless of formatting ("55000" vs "55000.00").
fn same_amount(raw: &str, total: u64) -> bool {
  Decimal::from_str(raw.trim())
    .map(|amt| amt == Decimal::from(total))
    .unwrap_or(false)
}

#[instrument(name = "reconcile::apply_status_transition", skip_all, fields(order_id))]
async fn apply_status_transition(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let (deps, notification, channel, order_id) = {
    let guard = ctx_data.read();
    match (&guard.notification, guard.order_id) {
      (Some(n), Some(id)) => (guard.deps.clone(), n.clone(), guard.raw.channel, id),
      _ => return Err(AppError::Internal("Notification reached apply step unresolved".to_string())),
    }
  };
  tracing::Span::current().record("order_id", order_id.0);

  let _order_lock = deps.locks.lock(order_id).await;
  let limit = deps.settings.external_timeout;

  let Some(order) = bounded("commerce service", limit, deps.commerce.get_order(order_id)).await?? else {
    warn!(%order_id, "Notification for unknown order, discarded.");
    return discard(&ctx_data, DiscardReason::OrderNotFound);
  };

  if let ProviderNotification::Eximbay(n) = &notification {
    let amount_ok = n.amt.as_deref().map(|a| same_amount(a, order.total)).unwrap_or(false);
    let currency_ok = n.cur.as_deref() == Some(order.currency.as_str());
    if !(amount_ok && currency_ok) {
      warn!(
        target: "audit",
        %order_id,
        order_total = order.total,
        order_currency = %order.currency,
        notified_amount = ?n.amt,
        notified_currency = ?n.cur,
        "Notification amount does not match order, discarded."
      );
      return discard(&ctx_data, DiscardReason::AmountMismatch);
    }
  }

  let unchanged = ReconcileOutcome::Unchanged {
    order_id,
    status: order.status,
  };
  let Some(target) = notification.status_intent(channel) else {
    debug!(%order_id, status = %order.status, channel = channel.as_str(), "Notification carries no status change.");
    ctx_data.write().outcome = Some(unchanged);
    return Ok(PipelineControl::Continue);
  };

  let attempt = notification.payment_reference();
  let policy = if attempt.is_some() && attempt != order.payment_reference {
    deps.settings.retry_policy
  } else {
    RetryPolicy::Terminal
  };

  let outcome = match order.status.transition_to(target, policy) {
    Transition::Apply => {
      bounded(
        "commerce service",
        limit,
        deps.commerce.update_order_status(order_id, target, attempt.as_deref()),
      )
      .await??;
      info!(%order_id, from = %order.status, to = %target, "Order status updated.");
      ReconcileOutcome::Applied {
        order_id,
        from: order.status,
        to: target,
      }
    }
    Transition::Unchanged => unchanged,
    Transition::Ignored => {
      info!(
        %order_id,
        current = %order.status,
        requested = %target,
        "Late or backward notification ignored."
      );
      unchanged
    }
  };

  ctx_data.write().outcome = Some(outcome);
  Ok(PipelineControl::Continue)
}
