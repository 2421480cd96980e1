// storefront/src/models/mod.rs

pub mod billing;
pub mod cart_item;
pub mod order;
pub mod reconcile;

pub use billing::Billing;
pub use cart_item::{CartLineItem, NewCartItem};
pub use order::{NewOrder, NewOrderLine, Order, OrderId, OrderLine, OrderStatus, RetryPolicy, Transition};
pub use reconcile::{DiscardReason, ReconcileOutcome};
