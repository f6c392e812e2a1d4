//! Client core for the Zoho Creator record API.
//!
//! # Overview
//! Four remote operations (acquire ticket, destroy ticket, add record,
//! update record) plus an update-else-add composite. Every operation returns
//! an `OperationResult`; failures are data, never `Err`.
//!
//! # Design
//! - `CreatorClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` turns the round trip's outcome into an `OperationResult`.
//! - `response` classifies the three wire shapes (session text, add/update
//!   XML, error-list XML) into `ParsedResponse` and normalizes each one.
//! - `CreatorApi` owns the `Session` ticket and drives a pluggable
//!   `Transport`; `UreqTransport` is the default blocking implementation.
//! - `catalog` maps the platform's numeric error codes to messages.

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod response;
pub mod session;
pub mod transport;
pub mod types;

pub use api::CreatorApi;
pub use client::CreatorClient;
pub use config::CreatorConfig;
pub use error::{ConfigError, TransportError};
pub use http::{Fields, HttpMethod, HttpRequest, HttpResponse};
pub use response::ParsedResponse;
pub use session::Session;
pub use transport::{Transport, TransportConfig, UreqTransport};
pub use types::{Credentials, ErrorDetail, OperationResult, RecordKind, RelationalOperator};
