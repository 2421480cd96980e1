// storefront/src/services/order_locks.rs

use crate::models::OrderId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = HashMap<OrderId, Arc<AsyncMutex<()>>>;

/// One async mutex per order id, created on demand and dropped once no
/// guard or waiter refers to it. Different orders never wait on each other.
///
/// The locks are process-local.
#[derive(Clone, Default)]
pub struct OrderLocks {
  table: Arc<Mutex<LockTable>>,
}

impl std::fmt::Debug for OrderLocks {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OrderLocks").field("tracked", &self.tracked()).finish()
  }
}

impl OrderLocks {
  pub fn new() -> Self {
    Self::default()
  }

  /// Waits until no other guard for `order_id` is alive.
  ///
  /// Dropping the returned future while it waits is safe: the waiter's
  /// claim on the table entry goes with it.
  pub async fn lock(&self, order_id: OrderId) -> OrderLockGuard {
    let mutex = {
      let mut table = self.table.lock();
      Arc::clone(table.entry(order_id).or_insert_with(|| Arc::new(AsyncMutex::new(()))))
    };
    let guard = Acquire {
      order_id,
      pending: Some(Box::pin(mutex.lock_owned())),
      table: Arc::clone(&self.table),
    }
    .await;
    OrderLockGuard {
      order_id,
      guard: Some(guard),
      table: Arc::clone(&self.table),
    }
  }

  /// Number of orders with a live guard or waiter.
  pub fn tracked(&self) -> usize {
    self.table.lock().len()
  }
}

type PendingLock = Pin<Box<dyn Future<Output = OwnedMutexGuard<()>> + Send>>;

/// A wait on one order's mutex. The pending future owns a clone of the
/// table entry, so a wait abandoned before it completes must give the entry
/// back the same way a guard does.
struct Acquire {
  order_id: OrderId,
  pending: Option<PendingLock>,
  table: Arc<Mutex<LockTable>>,
}

impl Future for Acquire {
  type Output = OwnedMutexGuard<()>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let Some(pending) = self.pending.as_mut() else {
      return Poll::Pending;
    };
    match pending.as_mut().poll(cx) {
      Poll::Ready(guard) => {
        self.pending = None;
        Poll::Ready(guard)
      }
      Poll::Pending => Poll::Pending,
    }
  }
}

impl Drop for Acquire {
  fn drop(&mut self) {
    if self.pending.is_some() {
      let pending = &mut self.pending;
      release_entry(&self.table, self.order_id, || {
        pending.take();
      });
    }
  }
}

/// Runs `release` under the table lock, then drops the entry if nothing
/// else refers to it. Holding the table lock keeps a new waiter from cloning
/// the entry between the release and the removal.
fn release_entry(table: &Mutex<LockTable>, order_id: OrderId, release: impl FnOnce()) {
  let mut table = table.lock();
  release();
  if let Some(mutex) = table.get(&order_id) {
    if Arc::strong_count(mutex) == 1 {
      table.remove(&order_id);
    }
  }
}

pub struct OrderLockGuard {
  order_id: OrderId,
  guard: Option<OwnedMutexGuard<()>>,
  table: Arc<Mutex<LockTable>>,
}

impl OrderLockGuard {
  pub fn order_id(&self) -> OrderId {
    self.order_id
  }
}

impl Drop for OrderLockGuard {
  fn drop(&mut self) {
    let guard = &mut self.guard;
    release_entry(&self.table, self.order_id, || {
      guard.take();
    });
  }
}
