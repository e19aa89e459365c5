//! rtc-core library.
//!
//! Client-side model of an OSLC-CM work item: subscriber and comment
//! mutations guarded by `If-Match`, plus workflow action/state lookup.

pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod mutation;
pub mod rdf;
pub mod service;
pub mod transport;
pub mod workitem;
pub mod xml;

/// # Conventions
///
/// - **Errors**: library operations return [`error::Result`]; config loading
///   returns `anyhow::Result`.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).
pub use client::RtcClient;
pub use error::{ErrorCode, Result, RtcError};
pub use mutation::MutationOutcome;
pub use workitem::Workitem;
