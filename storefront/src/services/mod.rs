// storefront/src/services/mod.rs

pub mod commerce;
pub mod memory_commerce;
pub mod order_locks;
pub mod woocommerce;

pub use commerce::{CommerceError, CommerceService};
pub use memory_commerce::InMemoryCommerce;
pub use order_locks::{OrderLockGuard, OrderLocks};
pub use woocommerce::{WooCommerceClient, WooCommerceConfig};
