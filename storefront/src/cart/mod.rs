// storefront/src/cart/mod.rs

//! Client-owned shopping cart: line items, derived totals, persistence.
//!
//! The orchestrator never mutates a cart. Checkout takes a [`CartSnapshot`]
//! and works from that copy.

pub mod analytics;
pub mod storage;
pub mod store;

pub use analytics::{CartEvents, TracingCartEvents};
pub use storage::{CartStorage, CartStorageError, FileCartStorage, MemoryCartStorage, CART_STORAGE_KEY};
pub use store::{CartSnapshot, CartStore};
