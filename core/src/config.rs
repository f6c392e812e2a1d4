//! Client configuration: credentials, endpoints, and transport settings.

use std::time::Duration;

use crate::error::ConfigError;
use crate::transport::TransportConfig;
use crate::types::Credentials;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";
pub const DEFAULT_API_URL: &str = "https://creator.zoho.com/api";

#[derive(Debug, Clone)]
pub struct CreatorConfig {
    pub credentials: Credentials,
    /// Base of the `/login` and `/logout` endpoints.
    pub accounts_url: String,
    /// Base of the `/xml/<application>/<form>/<op>/` endpoints.
    pub api_url: String,
    pub transport: TransportConfig,
}

impl CreatorConfig {
    /// Configuration against the public platform endpoints.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            transport: TransportConfig::default(),
        }
    }

    /// Point both services at other hosts, e.g. a local mock.
    pub fn with_endpoints(
        mut self,
        accounts_url: &str,
        api_url: &str,
    ) -> Result<Self, ConfigError> {
        self.accounts_url = validate_url("accounts_url", accounts_url)?;
        self.api_url = validate_url("api_url", api_url)?;
        Ok(self)
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Read configuration from `ZOHO_*` environment variables.
    ///
    /// Required: `ZOHO_LOGIN_ID`, `ZOHO_PASSWORD`, `ZOHO_API_KEY`,
    /// `ZOHO_APPLICATION`. Optional: `ZOHO_ACCOUNTS_URL`, `ZOHO_API_URL`,
    /// `ZOHO_ACCEPT_INVALID_CERTS`, `ZOHO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let credentials = Credentials::new(
            required("ZOHO_LOGIN_ID")?,
            required("ZOHO_PASSWORD")?,
            required("ZOHO_API_KEY")?,
            required("ZOHO_APPLICATION")?,
        );

        let accounts_url =
            lookup("ZOHO_ACCOUNTS_URL").unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string());
        let api_url = lookup("ZOHO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mut transport = TransportConfig::default();
        if let Some(value) = lookup("ZOHO_ACCEPT_INVALID_CERTS") {
            transport.accept_invalid_certs = parse_bool("ZOHO_ACCEPT_INVALID_CERTS", &value)?;
        }
        if let Some(value) = lookup("ZOHO_TIMEOUT_SECS") {
            let secs: u64 = value.parse().map_err(|e| ConfigError::Invalid {
                name: "ZOHO_TIMEOUT_SECS",
                reason: format!("{e}"),
            })?;
            transport.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Self::new(credentials)
            .with_endpoints(&accounts_url, &api_url)
            .map(|config| config.with_transport(transport))
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}
