// core/src/lib.rs

//! Step pipelines for storefront workflows.
//!
//! A [`Pipeline`] is an ordered list of named steps. Every step can carry
//! `before`, `on` and `after` handlers that run against a shared
//! [`ContextData`]. Handlers are async and either let the run continue or end
//! it early with [`PipelineControl::Stop`]; an `Err` aborts the run and is
//! returned to the caller unchanged.
//!
//! Pipelines are registered in a [`Workflows`] registry keyed by the type of
//! their context data, so callers only need to build a context and hand it to
//! [`Workflows::run`].
//!
//! ```text
//!   validate ──▶ create_order ──▶ begin_charge
//!      │              │
//!      └─ Stop ◀──────┘  (handler decided there is nothing left to do)
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{Handler, HandlerFuture};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::definition::Pipeline;
pub use crate::registry::Workflows;
