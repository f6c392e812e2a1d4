//! HTTP round trips described as plain data.
//!
//! # Design
//! `CreatorClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. A `Transport` executes the request in
//! between. Keeping the wire format as data lets the normalization layer be
//! tested against captured payloads alone.

use std::collections::BTreeMap;

/// Record fields and query parameters, keyed by wire name.
///
/// A sorted map keeps encoded bodies deterministic, and inserting a reserved
/// key (`apikey`, `ticket`, ...) overrides any caller value of the same name.
pub type Fields = BTreeMap<String, String>;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// A bodiless GET whose parameters live in the query string.
    pub fn get(base: &str, query: &[(&str, &str)]) -> Self {
        let url = if query.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{}", encode_pairs(query.iter().copied()))
        };
        Self {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST carrying `fields` as a form-encoded body.
    pub fn post_form(url: String, fields: &Fields) -> Self {
        let body = encode_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Self {
            method: HttpMethod::Post,
            url,
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(body),
        }
    }
}

/// An HTTP response described as plain data.
///
/// The status is carried for diagnostics only; the remote platform reports
/// outcomes in the body, so parsing never branches on it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
