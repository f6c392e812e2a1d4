//! Normalization of the platform's three wire shapes into `OperationResult`.
//!
//! # Design
//! Parsing and normalization are separate steps. `parse_session_text` and
//! `parse_record_xml` classify a raw body into a closed set of shapes
//! (`ParsedResponse`); `normalize` then maps each shape to the uniform
//! result with no further inspection of the payload.
//!
//! The platform has no search endpoint, so an update that matches nothing is
//! only recognizable by the exact status sentence it returns. That comparison
//! lives in `is_no_records_found` and nowhere else; if the platform rewords
//! the sentence, that predicate is the single point to change.

use std::collections::HashMap;

use serde::Deserialize;

use crate::catalog::{self, NO_RECORDS_FOUND_CODE};
use crate::types::{OperationResult, RecordKind};

/// Status text the platform returns for a successful add or update.
pub const SUCCESS_STATUS: &str = "Success";

/// Status text the platform returns for an update that matched no records.
pub const NO_RECORDS_FOUND_STATUS: &str = "Failure, No Records Found With Specified Criteria";

/// Error code reported when a round trip produced no response.
pub const TRANSPORT_FAILURE_CODE: &str = "400";

/// Error message paired with `TRANSPORT_FAILURE_CODE`.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Bad Request.";

/// Returns true if `status` is the platform's no-match sentence.
pub fn is_no_records_found(status: &str) -> bool {
    status == NO_RECORDS_FOUND_STATUS
}

/// The recognized shapes of a raw response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// No response reached the client.
    TransportFailure,

    /// `KEY=VALUE` lines from the accounts service.
    TextKeyValue(HashMap<String, String>),

    /// `result.form.add.status` of an add response.
    AddResult { status: String },

    /// `result.form.update.status` of an update response.
    UpdateResult { status: String },

    /// `errorlist.error.code`; the code may be missing or empty.
    ErrorListResult { code: Option<String> },

    /// A body that matches none of the shapes above.
    Unrecognized,
}

/// Classify a session (login/logout) body.
pub fn parse_session_text(body: Option<&str>) -> ParsedResponse {
    let Some(body) = body.filter(|b| !b.is_empty()) else {
        return ParsedResponse::TransportFailure;
    };
    let params = body
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    ParsedResponse::TextKeyValue(params)
}

/// Classify an add/update XML body for the given operation kind.
pub fn parse_record_xml(body: Option<&str>, kind: RecordKind) -> ParsedResponse {
    let Some(body) = body.filter(|b| !b.is_empty()) else {
        return ParsedResponse::TransportFailure;
    };
    let document: RecordDocument = match quick_xml::de::from_str(body) {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!(error = %e, "record response is not a recognized XML document");
            return ParsedResponse::Unrecognized;
        }
    };

    let status = document
        .result
        .as_ref()
        .and_then(|result| result.form.first())
        .and_then(|form| match kind {
            RecordKind::Add => form.add.as_ref(),
            RecordKind::Update => form.update.as_ref(),
        })
        .and_then(|node| node.status.clone());
    if let Some(status) = status {
        return match kind {
            RecordKind::Add => ParsedResponse::AddResult { status },
            RecordKind::Update => ParsedResponse::UpdateResult { status },
        };
    }

    if let Some(error) = document
        .errorlist
        .as_ref()
        .and_then(|list| list.error.first())
    {
        let code = error
            .code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string);
        return ParsedResponse::ErrorListResult { code };
    }

    ParsedResponse::Unrecognized
}

/// Map a classified response to the uniform result, attaching `raw`.
pub fn normalize(parsed: ParsedResponse, raw: Option<String>) -> OperationResult {
    match parsed {
        ParsedResponse::TransportFailure => OperationResult::failed(
            None,
            Some(TRANSPORT_FAILURE_CODE.to_string()),
            Some(TRANSPORT_FAILURE_MESSAGE.to_string()),
        ),
        ParsedResponse::TextKeyValue(params) => normalize_session(&params, raw),
        ParsedResponse::AddResult { status } => normalize_status(RecordKind::Add, &status, raw),
        ParsedResponse::UpdateResult { status } => {
            normalize_status(RecordKind::Update, &status, raw)
        }
        ParsedResponse::ErrorListResult { code } => {
            let message = code.as_deref().and_then(catalog::lookup).map(str::to_string);
            OperationResult::failed(raw, code, message)
        }
        ParsedResponse::Unrecognized => OperationResult::failed(raw, None, None),
    }
}

/// Like `normalize`, but reclassifies the no-records code as a successful
/// update that changed nothing.
pub fn normalize_record(
    parsed: ParsedResponse,
    kind: RecordKind,
    raw: Option<String>,
) -> OperationResult {
    let result = normalize(parsed, raw);
    if kind == RecordKind::Update && result.error_code() == Some(NO_RECORDS_FOUND_CODE) {
        return OperationResult {
            updated: Some(false),
            ..OperationResult::succeeded(result.raw_response)
        };
    }
    result
}

fn normalize_status(kind: RecordKind, status: &str, raw: Option<String>) -> OperationResult {
    // Padding around the element text is not part of the status. Both
    // comparisons below are exact on the trimmed text.
    let status = status.trim();
    if status == SUCCESS_STATUS {
        let mut result = OperationResult::succeeded(raw);
        if kind == RecordKind::Update {
            result.updated = Some(true);
        }
        return result;
    }
    if is_no_records_found(status) {
        return OperationResult::failed(
            raw,
            Some(NO_RECORDS_FOUND_CODE.to_string()),
            catalog::lookup(NO_RECORDS_FOUND_CODE).map(str::to_string),
        );
    }
    OperationResult::failed(raw, None, Some(status.to_string()))
}

fn normalize_session(params: &HashMap<String, String>, raw: Option<String>) -> OperationResult {
    if params.get("RESULT").map(String::as_str) == Some("TRUE") {
        return OperationResult {
            api_ticket: params.get("TICKET").cloned(),
            ..OperationResult::succeeded(raw)
        };
    }
    let cause = ["CAUSE", "WARNING"]
        .iter()
        .filter_map(|key| params.get(*key))
        .find(|value| value.as_str() != "null")
        .cloned();
    OperationResult::failed(raw, None, cause)
}

// Only the nodes the normalizer reads are modeled; everything else in the
// document is skipped. Repeated `form`/`error` lists may be interleaved with
// other elements, which needs quick-xml's `overlapped-lists`.

#[derive(Debug, Default, Deserialize)]
struct RecordDocument {
    #[serde(default)]
    result: Option<ResultNode>,
    #[serde(default)]
    errorlist: Option<ErrorListNode>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultNode {
    #[serde(default)]
    form: Vec<FormNode>,
}

#[derive(Debug, Default, Deserialize)]
struct FormNode {
    #[serde(default)]
    add: Option<StatusNode>,
    #[serde(default)]
    update: Option<StatusNode>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusNode {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorListNode {
    #[serde(default)]
    error: Vec<ErrorNode>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorNode {
    #[serde(default)]
    code: Option<String>,
}
