//! Full session and record lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `CreatorApi` with the
//! real `UreqTransport` over HTTP. Validates that request building, the
//! transport, and response normalization agree with the server end to end.

use std::time::Duration;

use creator_core::{
    CreatorApi, CreatorConfig, Credentials, Fields, RecordKind, RelationalOperator, Session,
    TransportConfig,
};
use mock_server::{Account, Db};

/// Start the mock server on a random port and return its base URL and store.
fn start_server() -> (String, Db) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db = Db::default();
    let server_db = db.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, Account::default(), server_db).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), db)
}

fn config(base: &str, password: &str) -> CreatorConfig {
    let account = Account::default();
    let credentials = Credentials::new(account.login_id, password, account.api_key, "crm");
    CreatorConfig::new(credentials)
        .with_endpoints(base, &format!("{base}/api"))
        .unwrap()
        .with_transport(TransportConfig {
            accept_invalid_certs: false,
            timeout: Some(Duration::from_secs(5)),
        })
}

fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn stored_records(db: &Db) -> Vec<mock_server::Record> {
    db.blocking_read().records("crm", "Employee").to_vec()
}

#[test]
fn record_lifecycle() {
    let (base, db) = start_server();
    let mut api = CreatorApi::from_config(config(&base, "secret"));

    // Step 1: acquire a ticket.
    let result = api.acquire_ticket();
    assert!(result.success, "acquire failed: {result:?}");
    let ticket = result.api_ticket.clone().unwrap();
    assert_eq!(api.session().ticket(), Some(ticket.as_str()));
    assert!(result.raw_response.unwrap().contains("RESULT=TRUE"));

    // Step 2: add a record.
    let jane = fields(&[("Name", "Jane"), ("City", "Paris")]);
    let result = api.add("Employee", &jane);
    assert!(result.success, "add failed: {result:?}");
    assert_eq!(result.updated, None);
    assert_eq!(stored_records(&db).len(), 1);

    // Step 3: update it.
    let result = api.update(
        "Employee",
        &fields(&[("City", "Rome")]),
        r#"Name == "Jane""#,
        RelationalOperator::And,
    );
    assert!(result.success, "update failed: {result:?}");
    assert_eq!(result.updated, Some(true));
    assert_eq!(stored_records(&db)[0]["City"], "Rome");

    // Step 4: update with no match reports success without update.
    let result = api.update(
        "Employee",
        &fields(&[("City", "Oslo")]),
        r#"Name == "John""#,
        RelationalOperator::And,
    );
    assert!(result.success);
    assert_eq!(result.updated, Some(false));
    assert!(result.error.is_none());

    // Step 5: update-else-add on an existing record updates it.
    let result = api.update_else_add(
        "Employee",
        &fields(&[("Name", "Jane"), ("City", "Lima")]),
        r#"Name == "Jane""#,
    );
    assert_eq!(result.method, Some(RecordKind::Update));
    assert_eq!(result.updated, Some(true));
    assert_eq!(stored_records(&db).len(), 1);

    // Step 6: update-else-add on a missing record adds it.
    let john = fields(&[("Name", "John"), ("City", "Oslo")]);
    let result = api.update_else_add("Employee", &john, r#"Name == "John""#);
    assert_eq!(result.method, Some(RecordKind::Add));
    assert!(result.success);
    assert_eq!(result.updated, None);
    let records = stored_records(&db);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1], john);

    // Step 7: a criteria-less update fails and does not fall back to add.
    let result = api.update_else_add("Employee", &fields(&[("Name", "Ann")]), "");
    assert!(!result.success);
    assert_eq!(result.method, Some(RecordKind::Update));
    assert_eq!(result.error_code(), Some("2907"));
    assert_eq!(stored_records(&db).len(), 2);

    // Step 8: destroy the ticket.
    let result = api.destroy_ticket();
    assert!(result.success, "destroy failed: {result:?}");
    assert!(!api.session().is_active());

    // Step 9: without a ticket the platform rejects record operations.
    let result = api.add("Employee", &jane);
    assert!(!result.success);
    assert_eq!(result.error_code(), Some("2917"));
    assert_eq!(
        result.error_message(),
        Some("You must login to access this API.")
    );

    // Step 10: a destroyed ticket is no longer accepted.
    let api =
        CreatorApi::from_config(config(&base, "secret")).with_session(Session::with_ticket(ticket));
    let result = api.add("Employee", &jane);
    assert_eq!(result.error_code(), Some("2913"));
    assert_eq!(result.error_message(), Some("Invalid ticket."));
}

#[test]
fn bad_password_is_reported_as_data() {
    let (base, _db) = start_server();
    let mut api = CreatorApi::from_config(config(&base, "wrong"));

    let result = api.acquire_ticket();
    assert!(!result.success);
    assert_eq!(result.error_code(), None);
    assert_eq!(result.error_message(), Some("Invalid Password"));
    assert!(result.api_ticket.is_none());
    assert!(!api.session().is_active());
}

#[test]
fn destroy_without_ticket_fails() {
    let (base, _db) = start_server();
    let mut api = CreatorApi::from_config(config(&base, "secret"));

    let result = api.destroy_ticket();
    assert!(!result.success);
    assert_eq!(result.error_message(), Some("Invalid ticket"));
}

#[test]
fn unreachable_server_yields_sentinel() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let base = format!("http://127.0.0.1:{port}");
    let mut api = CreatorApi::from_config(config(&base, "secret"));

    for result in [
        api.acquire_ticket(),
        api.add("Employee", &fields(&[("Name", "Jane")])),
        api.update_else_add("Employee", &fields(&[("Name", "Jane")]), r#"Name == "Jane""#),
    ] {
        assert!(!result.success);
        assert_eq!(result.error_code(), Some("400"));
        assert_eq!(result.error_message(), Some("Bad Request."));
        assert!(result.raw_response.is_none());
    }
}
