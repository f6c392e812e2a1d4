//! Session-aware facade that runs operations over a `Transport`.
//!
//! # Design
//! `CreatorApi` pairs the stateless `CreatorClient` with the one piece of
//! mutable state, the `Session`, and a transport. Each operation performs at
//! most one round trip (two for `update_else_add`) and returns an
//! `OperationResult`; nothing here returns `Err`. Callers sharing an instance
//! across threads must serialize session lifecycle calls themselves.

use tracing::{debug, info, warn};

use crate::client::CreatorClient;
use crate::config::CreatorConfig;
use crate::http::{Fields, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{OperationResult, RecordKind, RelationalOperator};

pub struct CreatorApi<T> {
    client: CreatorClient,
    session: Session,
    transport: T,
}

impl CreatorApi<UreqTransport> {
    /// Client using the default blocking transport built from `config`.
    pub fn from_config(config: CreatorConfig) -> Self {
        let transport = UreqTransport::new(&config.transport);
        Self::new(config, transport)
    }
}

impl<T: Transport> CreatorApi<T> {
    pub fn new(config: CreatorConfig, transport: T) -> Self {
        Self {
            client: CreatorClient::new(config),
            session: Session::default(),
            transport,
        }
    }

    /// Resume a session whose ticket was obtained elsewhere.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> &CreatorClient {
        &self.client
    }

    /// Log in and store the issued ticket. A failed attempt leaves no ticket.
    pub fn acquire_ticket(&mut self) -> OperationResult {
        let request = self.client.build_acquire_ticket();
        let result = self.client.parse_ticket_response(self.execute(&request));
        match (result.success, result.api_ticket.clone()) {
            (true, Some(ticket)) => {
                info!(
                    login_id = self.client.config().credentials.login_id(),
                    "api ticket acquired"
                );
                self.session.activate(ticket);
            }
            _ => {
                if !result.success {
                    warn!(cause = ?result.error_message(), "api ticket request rejected");
                }
                self.session.clear();
            }
        }
        result
    }

    /// Log out. The stored ticket is cleared only when the platform confirms.
    pub fn destroy_ticket(&mut self) -> OperationResult {
        let request = self.client.build_destroy_ticket(self.session.ticket());
        let result = self.client.parse_ticket_response(self.execute(&request));
        if result.success {
            info!("api ticket destroyed");
            self.session.clear();
        }
        result
    }

    pub fn add(&self, form: &str, fields: &Fields) -> OperationResult {
        let request = self.client.build_add(form, fields, self.session.ticket());
        self.client.parse_add(self.execute(&request))
    }

    pub fn update(
        &self,
        form: &str,
        fields: &Fields,
        criteria: &str,
        operator: RelationalOperator,
    ) -> OperationResult {
        let request = self
            .client
            .build_update(form, fields, criteria, operator, self.session.ticket());
        self.client.parse_update(self.execute(&request))
    }

    /// Update the records matching `criteria`; if none match, add `fields`
    /// as a new record instead. An update that failed outright is returned
    /// as-is without attempting the add.
    pub fn update_else_add(&self, form: &str, fields: &Fields, criteria: &str) -> OperationResult {
        let mut result = self.update(form, fields, criteria, RelationalOperator::default());
        result.method = Some(RecordKind::Update);
        if result.is_no_match() {
            debug!(form, "no records matched criteria, adding instead");
            result = self.add(form, fields);
            result.method = Some(RecordKind::Add);
        }
        result
    }

    fn execute(&self, request: &HttpRequest) -> Option<HttpResponse> {
        debug!(method = ?request.method, url = %redact_query(&request.url), "sending request");
        match self.transport.send(request) {
            Ok(response) => {
                debug!(status = response.status, bytes = response.body.len(), "response received");
                Some(response)
            }
            Err(e) => {
                warn!(error = %e, "transport failure");
                None
            }
        }
    }
}

/// Login URLs carry the password in the query string; never log it.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::error::TransportError;
    use crate::types::Credentials;

    const UPDATE_SUCCESS: &str =
        "<response><result><form><update><status>Success</status></update></form></result></response>";
    const UPDATE_NO_MATCH: &str =
        "<response><result><form><update><status>Failure, No Records Found With Specified Criteria</status></update></form></result></response>";
    const ADD_SUCCESS: &str =
        "<response><result><form><add><status>Success</status></add></form></result></response>";
    const PERMISSION_DENIED: &str =
        "<response><errorlist><error><code>2897</code></error></errorlist></response>";

    /// Replays canned bodies in order and records every request it sees.
    /// `None` simulates a connection failure.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: RefCell<VecDeque<Option<&'static str>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: &[Option<&'static str>]) -> Self {
            Self {
                replies: RefCell::new(replies.iter().copied().collect()),
                seen: RefCell::default(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            match self.replies.borrow_mut().pop_front().flatten() {
                Some(body) => Ok(HttpResponse {
                    status: 200,
                    headers: Vec::new(),
                    body: body.to_string(),
                }),
                None => Err(TransportError::Request("connection refused".to_string())),
            }
        }
    }

    fn api(replies: &[Option<&'static str>]) -> CreatorApi<ScriptedTransport> {
        let credentials = Credentials::new("me@example.com", "secret", "key-1", "crm");
        let config = CreatorConfig::new(credentials)
            .with_endpoints("http://accounts.test", "http://creator.test/api")
            .unwrap();
        CreatorApi::new(config, ScriptedTransport::new(replies))
    }

    fn fields() -> Fields {
        Fields::from([("Name".to_string(), "Jane".to_string())])
    }

    #[test]
    fn acquire_stores_ticket() {
        let mut api = api(&[Some("RESULT=TRUE\nTICKET=abc123")]);
        let result = api.acquire_ticket();
        assert!(result.success);
        assert_eq!(result.api_ticket.as_deref(), Some("abc123"));
        assert_eq!(api.session().ticket(), Some("abc123"));
    }

    #[test]
    fn failed_acquire_clears_previous_ticket() {
        let mut api = api(&[Some("RESULT=FALSE\nCAUSE=bad login")])
            .with_session(Session::with_ticket("stale"));
        let result = api.acquire_ticket();
        assert!(!result.success);
        assert_eq!(result.error_message(), Some("bad login"));
        assert_eq!(result.error_code(), None);
        assert!(!api.session().is_active());
    }

    #[test]
    fn destroy_clears_ticket_only_on_success() {
        let mut api = api(&[Some("RESULT=FALSE\nCAUSE=Invalid ticket"), Some("RESULT=TRUE")])
            .with_session(Session::with_ticket("abc"));

        let result = api.destroy_ticket();
        assert!(!result.success);
        assert_eq!(api.session().ticket(), Some("abc"));

        let result = api.destroy_ticket();
        assert!(result.success);
        assert!(!api.session().is_active());

        let urls: Vec<String> = api
            .transport
            .seen
            .borrow()
            .iter()
            .map(|r| r.url.clone())
            .collect();
        assert_eq!(
            urls,
            vec![
                "http://accounts.test/logout?ticket=abc&FROM_AGENT=true",
                "http://accounts.test/logout?ticket=abc&FROM_AGENT=true",
            ]
        );
    }

    #[test]
    fn add_sends_current_ticket() {
        let api = api(&[Some(ADD_SUCCESS)]).with_session(Session::with_ticket("t-9"));
        let result = api.add("Employee", &fields());
        assert!(result.success);
        assert_eq!(result.updated, None);

        let seen = api.transport.seen.borrow();
        assert_eq!(seen[0].url, "http://creator.test/api/xml/crm/Employee/add/");
        assert_eq!(seen[0].body.as_deref(), Some("Name=Jane&apikey=key-1&ticket=t-9"));
    }

    #[test]
    fn transport_failure_is_sentinel_result() {
        let mut api = api(&[None, None, None]);
        let expected = OperationResult::failed(
            None,
            Some("400".to_string()),
            Some("Bad Request.".to_string()),
        );
        assert_eq!(api.acquire_ticket(), expected);
        assert_eq!(api.add("Employee", &fields()), expected);
        assert_eq!(
            api.update("Employee", &fields(), "ID == 1", RelationalOperator::And),
            expected
        );
    }

    #[test]
    fn update_else_add_keeps_successful_update() {
        let api = api(&[Some(UPDATE_SUCCESS)]);
        let result = api.update_else_add("Employee", &fields(), "Name == \"Jane\"");
        assert_eq!(result.method, Some(RecordKind::Update));
        assert!(result.success);
        assert_eq!(result.updated, Some(true));
        assert_eq!(api.transport.seen.borrow().len(), 1);
    }

    #[test]
    fn update_else_add_falls_back_to_add_on_no_match() {
        let api = api(&[Some(UPDATE_NO_MATCH), Some(ADD_SUCCESS)]);
        let result = api.update_else_add("Employee", &fields(), "Name == \"Jane\"");

        let mut expected = api_add_alone();
        expected.method = Some(RecordKind::Add);
        assert_eq!(result, expected);

        let seen = api.transport.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].url.ends_with("/update/"));
        assert!(seen[0].body.as_deref().unwrap().contains("reloperator=AND"));
        assert!(seen[1].url.ends_with("/add/"));
        assert!(!seen[1].body.as_deref().unwrap().contains("criteria"));
    }

    fn api_add_alone() -> OperationResult {
        api(&[Some(ADD_SUCCESS)]).add("Employee", &fields())
    }

    #[test]
    fn update_else_add_does_not_add_after_failure() {
        let api = api(&[Some(PERMISSION_DENIED), Some(ADD_SUCCESS)]);
        let result = api.update_else_add("Employee", &fields(), "Name == \"Jane\"");
        assert!(!result.success);
        assert_eq!(result.method, Some(RecordKind::Update));
        assert_eq!(result.error_code(), Some("2897"));
        assert_eq!(
            result.error_message(),
            Some("Permission denied to update records.")
        );
        assert_eq!(api.transport.seen.borrow().len(), 1);
    }

    #[test]
    fn redact_query_drops_parameters() {
        assert_eq!(
            redact_query("https://accounts.test/login?PASSWORD=x"),
            "https://accounts.test/login"
        );
        assert_eq!(redact_query("https://creator.test/add/"), "https://creator.test/add/");
    }
}
