#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Generic action dispatcher for the GoCD REST API.
//!
//! Every resource call (agents, pipelines, templates, ...) funnels through
//! [`Client::http_action`], which builds the request through a pluggable
//! [`Transport`], attaches `If-Match` for [`Versioned`] payloads, refreshes the
//! version token from `Etag` on success, and reports request/response traces
//! to an injectable [`TraceObserver`].
//!
//! Layout:
//! - `action.rs`: request descriptor and the dispatcher with its method wrappers
//! - `client.rs`: the `Client` handle binding a transport to an observer
//! - `transport.rs`: transport seam, request/response envelopes, call context
//! - `reqwest_transport.rs`: production transport backed by `reqwest`
//! - `versioned.rs`: optimistic-concurrency capability and payload query trait
//! - `trace.rs`: trace observers
//! - `config.rs`: typed client configuration and validation
//! - `error.rs`: error taxonomy
//!
//! ```no_run
//! use gocd_client::{ActionRequest, CallContext, Client, ClientConfig};
//! use serde_json::Value;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::from_config(&ClientConfig::default())?;
//! let action = client
//!     .get_action::<(), Value>(&CallContext::new(), ActionRequest::new("api/agents", "v4"))
//!     .await?;
//! println!("{:?}", action.body);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod reqwest_transport;
pub mod trace;
pub mod transport;
pub mod versioned;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{Action, ActionRequest, ResponseType};
pub use client::Client;
pub use config::{ClientConfig, ConfigError, ConfigResult, Credentials};
pub use error::{ApiError, ApiResult, BoxError};
pub use models::StringResponse;
pub use reqwest_transport::ReqwestTransport;
pub use trace::{NoopObserver, TraceObserver, TracingObserver};
pub use transport::{ApiRequest, ApiResponse, CallContext, Transport, media_type_for};
pub use versioned::{Payload, Versioned, VersionedBody};
