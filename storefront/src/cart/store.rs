// storefront/src/cart/store.rs

use crate::cart::analytics::{CartEvents, TracingCartEvents};
use crate::cart::storage::{CartStorage, CartStorageError, MemoryCartStorage, CART_STORAGE_KEY};
use crate::models::{CartLineItem, NewCartItem};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable copy of the cart, taken for checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
  pub items: Vec<CartLineItem>,
  pub subtotal: u64,
  pub item_count: u64,
}

impl CartSnapshot {
  /// Builds a snapshot from raw lines, deriving the totals. Lines for the
  /// same product are merged in first-seen order. Zero quantities are kept
  /// so that checkout can reject them.
  pub fn from_items(items: Vec<CartLineItem>) -> Self {
    let items = merge_lines(items);
    let (subtotal, item_count) = totals(&items);
    Self {
      items,
      subtotal,
      item_count,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

#[derive(Serialize, Deserialize)]
struct PersistedCart {
  state: PersistedCartState,
  #[serde(default)]
  version: u32,
}

#[derive(Serialize, Deserialize)]
struct PersistedCartState {
  #[serde(default)]
  items: Vec<CartLineItem>,
}

#[derive(Default)]
struct CartState {
  items: Vec<CartLineItem>,
  subtotal: u64,
  item_count: u64,
  /// The last save failed; the next mutation must write again.
  dirty: bool,
}

impl CartState {
  fn recompute(&mut self) {
    let (subtotal, item_count) = totals(&self.items);
    self.subtotal = subtotal;
    self.item_count = item_count;
  }
}

/// Folds repeated `product_id` lines into the first one, summing quantities.
fn merge_lines(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
  let mut merged: Vec<CartLineItem> = Vec::with_capacity(items.len());
  for line in items {
    match merged.iter_mut().find(|l| l.product_id == line.product_id) {
      Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
      None => merged.push(line),
    }
  }
  merged
}

fn totals(items: &[CartLineItem]) -> (u64, u64) {
  items.iter().fold((0u64, 0u64), |(sum, count), line| {
    (sum.saturating_add(line.line_total()), count + u64::from(line.quantity))
  })
}

/// The shopper's cart.
///
/// All mutations are serialized behind one mutex and recompute `subtotal`
/// and `item_count` before the lock is released, so no reader can observe
/// stale totals. Each effective mutation writes the whole cart to storage;
/// a failed write is logged and retried by the next mutation.
pub struct CartStore {
  state: Mutex<CartState>,
  storage: Arc<dyn CartStorage>,
  events: Arc<dyn CartEvents>,
}

impl std::fmt::Debug for CartStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.state.lock();
    f.debug_struct("CartStore")
      .field("items", &state.items.len())
      .field("subtotal", &state.subtotal)
      .field("item_count", &state.item_count)
      .field("dirty", &state.dirty)
      .finish()
  }
}

impl CartStore {
  /// Loads the cart stored under [`CART_STORAGE_KEY`]. A missing or
  /// unreadable document gives an empty cart. Stored lines are normalized:
  /// duplicates merge into the first line and empty lines are dropped.
  pub fn open(storage: Arc<dyn CartStorage>, events: Arc<dyn CartEvents>) -> Self {
    let stored = match storage.load(CART_STORAGE_KEY) {
      Ok(Some(raw)) => match serde_json::from_str::<PersistedCart>(&raw) {
        Ok(doc) => doc.state.items,
        Err(e) => {
          warn!(error = %e, "Stored cart is unreadable, starting with an empty cart.");
          Vec::new()
        }
      },
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(error = %e, "Cart storage could not be read, starting with an empty cart.");
        Vec::new()
      }
    };

    let stored_lines = stored.len();
    let mut items = merge_lines(stored);
    items.retain(|l| l.quantity >= 1);
    if items.len() != stored_lines {
      warn!(stored_lines, kept = items.len(), "Stored cart had duplicate or empty lines, normalized.");
    }

    let mut state = CartState {
      items,
      ..Default::default()
    };
    state.recompute();
    debug!(items = state.items.len(), subtotal = state.subtotal, "Cart opened.");

    Self {
      state: Mutex::new(state),
      storage,
      events,
    }
  }

  /// A cart kept in memory only, with analytics going to tracing.
  pub fn in_memory() -> Self {
    Self::open(Arc::new(MemoryCartStorage::new()), Arc::new(TracingCartEvents::default()))
  }

  /// Adds `quantity` of `item`. An existing line for the same product grows
  /// by `quantity`; otherwise a new line is appended. `quantity <= 0` is
  /// ignored.
  pub fn add_item(&self, item: NewCartItem, quantity: i32) {
    let added = match u32::try_from(quantity) {
      Ok(q) if q > 0 => q,
      _ => {
        debug!(product_id = item.product_id, quantity, "Ignoring add with non-positive quantity.");
        self.retry_pending_write();
        return;
      }
    };

    let line = {
      let mut state = self.state.lock();
      let line = match state.items.iter().position(|l| l.product_id == item.product_id) {
        Some(idx) => {
          let existing = &mut state.items[idx];
          existing.quantity = existing.quantity.saturating_add(added);
          existing.clone()
        }
        None => {
          let line = item.with_quantity(added);
          state.items.push(line.clone());
          line
        }
      };
      state.recompute();
      self.persist(&mut state);
      line
    };

    if let Err(e) = self.events.item_added(&line, added) {
      warn!(product_id = line.product_id, error = %e, "add_to_cart signal was not delivered.");
    }
  }

  /// Removes the line for `product_id`, if any.
  pub fn remove_item(&self, product_id: u64) {
    let mut state = self.state.lock();
    let before = state.items.len();
    state.items.retain(|l| l.product_id != product_id);
    if state.items.len() == before {
      self.retry_pending_write_locked(&mut state);
      return;
    }
    state.recompute();
    self.persist(&mut state);
  }

  /// Sets the line's quantity to exactly `quantity`. `quantity <= 0` removes
  /// the line. Unknown products are ignored.
  pub fn update_quantity(&self, product_id: u64, quantity: i32) {
    let quantity = match u32::try_from(quantity) {
      Ok(q) if q > 0 => q,
      _ => return self.remove_item(product_id),
    };

    let mut state = self.state.lock();
    let idx = match state.items.iter().position(|l| l.product_id == product_id) {
      Some(idx) if state.items[idx].quantity != quantity => idx,
      _ => {
        self.retry_pending_write_locked(&mut state);
        return;
      }
    };
    state.items[idx].quantity = quantity;
    state.recompute();
    self.persist(&mut state);
  }

  pub fn clear_cart(&self) {
    let mut state = self.state.lock();
    state.items.clear();
    state.recompute();
    self.persist(&mut state);
  }

  pub fn items(&self) -> Vec<CartLineItem> {
    self.state.lock().items.clone()
  }

  pub fn subtotal(&self) -> u64 {
    self.state.lock().subtotal
  }

  pub fn item_count(&self) -> u64 {
    self.state.lock().item_count
  }

  pub fn is_empty(&self) -> bool {
    self.state.lock().items.is_empty()
  }

  /// `true` while the last write to storage has not succeeded.
  pub fn has_unsaved_changes(&self) -> bool {
    self.state.lock().dirty
  }

  pub fn snapshot(&self) -> CartSnapshot {
    let state = self.state.lock();
    CartSnapshot {
      items: state.items.clone(),
      subtotal: state.subtotal,
      item_count: state.item_count,
    }
  }

  fn retry_pending_write(&self) {
    let mut state = self.state.lock();
    self.retry_pending_write_locked(&mut state);
  }

  fn retry_pending_write_locked(&self, state: &mut CartState) {
    if state.dirty {
      self.persist(state);
    }
  }

  fn persist(&self, state: &mut CartState) {
    match self.write(&state.items) {
      Ok(()) => {
        if state.dirty {
          debug!("Cart storage caught up after an earlier failed write.");
        }
        state.dirty = false;
      }
      Err(e) => {
        warn!(error = %e, "Cart could not be saved, will retry on next change.");
        state.dirty = true;
      }
    }
  }

  fn write(&self, items: &[CartLineItem]) -> Result<(), CartStorageError> {
    let doc = PersistedCart {
      state: PersistedCartState { items: items.to_vec() },
      version: 0,
    };
    let raw = serde_json::to_string(&doc)?;
    self.storage.save(CART_STORAGE_KEY, &raw)
  }
}
