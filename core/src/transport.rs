//! The network collaborator and its default blocking implementation.
//!
//! # Design
//! The core never performs I/O itself; `CreatorApi` hands each `HttpRequest`
//! to a `Transport`. Redirects, TLS policy, and timeouts are the transport's
//! business. HTTP error statuses are not errors here: the platform reports
//! outcomes in the body, so any response that arrives is returned as data.

use std::time::Duration;

use tracing::warn;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round trip.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Settings for `UreqTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Skip TLS certificate verification.
    ///
    /// Insecure. Only for hosts that cannot validate the remote certificate
    /// chain. Defaults to `false`.
    pub accept_invalid_certs: bool,

    /// Overall deadline for one round trip. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for the Creator transport");
        }
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(config.accept_invalid_certs)
            .build();
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .tls_config(tls)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => {
                let mut builder = self.agent.get(request.url.as_str());
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.call()
            }
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(request.url.as_str());
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
