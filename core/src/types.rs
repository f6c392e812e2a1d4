//! Domain types shared by every operation.
//!
//! # Design
//! `OperationResult` is the one output shape of the public API. Optional
//! members are `None` (and omitted when serialized) unless the operation kind
//! and outcome call for them, so a serialized result reads the same as the
//! loose dictionaries callers of the platform are used to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Login and application identity for one client instance.
///
/// Immutable after construction. `Debug` never prints the password or key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login_id: String,
    password: String,
    api_key: String,
    application: String,
}

impl Credentials {
    pub fn new(
        login_id: impl Into<String>,
        password: impl Into<String>,
        api_key: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            login_id: login_id.into(),
            password: password.into(),
            api_key: api_key.into(),
            application: application.into(),
        }
    }

    pub fn login_id(&self) -> &str {
        &self.login_id
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn application(&self) -> &str {
        &self.application
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login_id", &self.login_id)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("application", &self.application)
            .finish()
    }
}

/// Which record endpoint a request targets. Also names the XML node that
/// carries the operation's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Add,
    Update,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Add => "add",
            RecordKind::Update => "update",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the clauses of an update criteria combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationalOperator {
    #[default]
    And,
    Or,
}

impl RelationalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationalOperator::And => "AND",
            RelationalOperator::Or => "OR",
        }
    }
}

/// Failure details. Either member may be unknown: the code and the message
/// are resolved independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Uniform outcome of every public operation.
///
/// Exactly one of these holds: `success` with no `error`, or `!success` with
/// `error` populated (its members may still be `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// The unparsed response body. `None` only when no response arrived.
    pub raw_response: Option<String>,

    pub success: bool,

    /// Update operations only: whether a record was actually changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<bool>,

    /// Successful ticket acquisition only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_ticket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,

    /// `update_else_add` only: the operation whose result this is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<RecordKind>,
}

impl OperationResult {
    pub fn succeeded(raw_response: Option<String>) -> Self {
        Self {
            raw_response,
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(
        raw_response: Option<String>,
        code: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            raw_response,
            success: false,
            error: Some(ErrorDetail { code, message }),
            ..Self::default()
        }
    }

    /// The error code, if the operation failed with a known one.
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.code.as_deref())
    }

    /// The error message, if the operation failed with a known one.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }

    /// True for an update that reached the platform but matched no records.
    pub fn is_no_match(&self) -> bool {
        self.success && self.updated == Some(false)
    }
}
