//! Error types that can surface outside the `OperationResult` contract.
//!
//! # Design
//! Remote operations never return `Err`: their failures are data inside
//! `OperationResult`. The enums here cover the two places where a Rust error
//! is the honest answer: a transport that could not complete a round trip
//! (consumed internally and turned into the `400` sentinel) and a
//! configuration that cannot be built.

use thiserror::Error;

/// A round trip that produced no usable response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    #[error("request failed: {0}")]
    Request(String),

    /// A response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Invalid or incomplete client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
