//! Core of the riptag wizard.
//!
//! The [`workflow::Controller`] is a synchronous state machine driven by
//! [`workflow::Event`]s. Work it asks for is run by the
//! [`workflow::Dispatcher`] on a tokio runtime, and results come back as
//! completion events. The download stage lives in [`fetch`]; the external
//! tools and web services sit behind the [`tools::ToolAdapter`] and
//! [`catalog::CatalogApi`] traits.

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod model;
pub mod tools;
pub mod workflow;

pub use error::{PayloadMismatch, ProviderError, ToolError, WorkflowError};
