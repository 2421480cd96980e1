// storefront/src/lib.rs

//! Storefront core for a travel eSIM shop: the client cart, and the
//! order/payment orchestrator that turns carts into commerce orders and
//! provider notifications into order status changes.

pub mod cart;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod payments;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

pub use errors::{AppError, Result};
pub use orchestrator::Orchestrator;
