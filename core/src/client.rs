//! Stateless request builder and response parser for the Creator API.
//!
//! # Design
//! `CreatorClient` holds configuration only and carries no state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes the outcome of the round
//! trip. `None` stands for "no response reached the client". Ticket state is
//! passed in explicitly, so the same client serves any number of sessions.

use crate::config::CreatorConfig;
use crate::http::{Fields, HttpRequest, HttpResponse};
use crate::response::{normalize, normalize_record, parse_record_xml, parse_session_text};
use crate::types::{OperationResult, RecordKind, RelationalOperator};

const SERVICE_NAME: &str = "ZohoCreator";
const FROM_AGENT: &str = "true";

#[derive(Debug, Clone)]
pub struct CreatorClient {
    config: CreatorConfig,
}

impl CreatorClient {
    pub fn new(config: CreatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CreatorConfig {
        &self.config
    }

    pub fn build_acquire_ticket(&self) -> HttpRequest {
        let credentials = &self.config.credentials;
        HttpRequest::get(
            &format!("{}/login", self.config.accounts_url),
            &[
                ("LOGIN_ID", credentials.login_id()),
                ("PASSWORD", credentials.password()),
                ("FROM_AGENT", FROM_AGENT),
                ("servicename", SERVICE_NAME),
            ],
        )
    }

    /// Without a ticket the `ticket` parameter is omitted altogether.
    pub fn build_destroy_ticket(&self, ticket: Option<&str>) -> HttpRequest {
        let mut query = Vec::with_capacity(2);
        if let Some(ticket) = ticket {
            query.push(("ticket", ticket));
        }
        query.push(("FROM_AGENT", FROM_AGENT));
        HttpRequest::get(&format!("{}/logout", self.config.accounts_url), &query)
    }

    /// `apikey` and `ticket` override caller fields of the same name. A
    /// missing ticket is sent empty and left for the platform to reject.
    pub fn build_add(&self, form: &str, fields: &Fields, ticket: Option<&str>) -> HttpRequest {
        let fields = self.with_auth(fields, ticket);
        HttpRequest::post_form(self.record_url(form, RecordKind::Add), &fields)
    }

    pub fn build_update(
        &self,
        form: &str,
        fields: &Fields,
        criteria: &str,
        operator: RelationalOperator,
        ticket: Option<&str>,
    ) -> HttpRequest {
        let mut fields = self.with_auth(fields, ticket);
        fields.insert("criteria".to_string(), criteria.to_string());
        fields.insert("reloperator".to_string(), operator.as_str().to_string());
        HttpRequest::post_form(self.record_url(form, RecordKind::Update), &fields)
    }

    /// Parses both login and logout responses.
    pub fn parse_ticket_response(&self, response: Option<HttpResponse>) -> OperationResult {
        let raw = response.map(|r| r.body);
        normalize(parse_session_text(raw.as_deref()), raw)
    }

    pub fn parse_add(&self, response: Option<HttpResponse>) -> OperationResult {
        self.parse_record(response, RecordKind::Add)
    }

    pub fn parse_update(&self, response: Option<HttpResponse>) -> OperationResult {
        self.parse_record(response, RecordKind::Update)
    }

    fn parse_record(&self, response: Option<HttpResponse>, kind: RecordKind) -> OperationResult {
        let raw = response.map(|r| r.body);
        normalize_record(parse_record_xml(raw.as_deref(), kind), kind, raw)
    }

    fn record_url(&self, form: &str, kind: RecordKind) -> String {
        format!(
            "{}/xml/{}/{}/{}/",
            self.config.api_url,
            self.config.credentials.application(),
            form,
            kind
        )
    }

    fn with_auth(&self, fields: &Fields, ticket: Option<&str>) -> Fields {
        let mut fields = fields.clone();
        fields.insert(
            "apikey".to_string(),
            self.config.credentials.api_key().to_string(),
        );
        fields.insert("ticket".to_string(), ticket.unwrap_or_default().to_string());
        fields
    }
}
