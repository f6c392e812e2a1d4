//! In-memory stand-in for the Creator accounts and record services.
//!
//! Speaks the same wire formats as the real platform: `KEY=VALUE` text from
//! `/login` and `/logout`, and XML from the add/update record endpoints.
//! Error responses carry bare numeric codes with no description.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Form, Router,
};
use quick_xml::escape::escape;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const NO_RECORDS_FOUND_STATUS: &str = "Failure, No Records Found With Specified Criteria";

/// Form fields the record endpoints consume themselves.
const RESERVED_FIELDS: &[&str] = &["apikey", "ticket", "criteria", "reloperator"];

/// The single user the mock accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub login_id: String,
    pub password: String,
    pub api_key: String,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            login_id: "owner@example.com".to_string(),
            password: "secret".to_string(),
            api_key: "mock-api-key".to_string(),
        }
    }
}

pub type Record = BTreeMap<String, String>;

#[derive(Debug, Default)]
pub struct Store {
    pub tickets: HashSet<String>,
    /// Records keyed by `(application, form)`.
    pub records: HashMap<(String, String), Vec<Record>>,
}

impl Store {
    pub fn records(&self, application: &str, form: &str) -> &[Record] {
        self.records
            .get(&(application.to_string(), form.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    account: Arc<Account>,
    db: Db,
}

pub fn app() -> Router {
    app_with(Account::default(), Db::default())
}

pub fn app_with(account: Account, db: Db) -> Router {
    let state = AppState {
        account: Arc::new(account),
        db,
    };
    Router::new()
        .route("/login", get(login).post(login))
        .route("/logout", get(logout).post(logout))
        .route("/api/xml/{application}/{form}/add/", post(add_record))
        .route("/api/xml/{application}/{form}/update/", post(update_record))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(
    listener: TcpListener,
    account: Account,
    db: Db,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(account, db)).await
}

// ---------------------------------------------------------------------------
// Accounts service
// ---------------------------------------------------------------------------

async fn login(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let login_id = params.get("LOGIN_ID").map(String::as_str).unwrap_or_default();
    let password = params.get("PASSWORD").map(String::as_str).unwrap_or_default();

    if login_id != state.account.login_id {
        return session_text(&[
            ("WARNING", "null"),
            ("CAUSE", "No such user"),
            ("RESULT", "FALSE"),
        ]);
    }
    if password != state.account.password {
        return session_text(&[
            ("WARNING", "null"),
            ("CAUSE", "Invalid Password"),
            ("RESULT", "FALSE"),
        ]);
    }
    if params.get("servicename").map(String::as_str) != Some("ZohoCreator") {
        return session_text(&[
            ("WARNING", "Service not specified"),
            ("CAUSE", "null"),
            ("RESULT", "FALSE"),
        ]);
    }

    let ticket = Uuid::new_v4().simple().to_string();
    state.db.write().await.tickets.insert(ticket.clone());
    info!(login_id, "issued ticket");
    session_text(&[
        ("GETUSERNAME", "null"),
        ("WARNING", "null"),
        ("PASSWORD", "null"),
        ("TICKET", ticket.as_str()),
        ("RESULT", "TRUE"),
    ])
}

async fn logout(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let removed = match params.get("ticket") {
        Some(ticket) => state.db.write().await.tickets.remove(ticket),
        None => false,
    };
    if removed {
        session_text(&[("RESULT", "TRUE")])
    } else {
        session_text(&[
            ("WARNING", "null"),
            ("CAUSE", "Invalid ticket"),
            ("RESULT", "FALSE"),
        ])
    }
}

fn session_text(pairs: &[(&str, &str)]) -> String {
    let mut body = String::from("#\n#Mock Creator accounts service\n");
    for (key, value) in pairs {
        body.push_str(key);
        body.push('=');
        body.push_str(value);
        body.push('\n');
    }
    body
}

// ---------------------------------------------------------------------------
// Record service
// ---------------------------------------------------------------------------

async fn add_record(
    State(state): State<AppState>,
    Path((application, form)): Path<(String, String)>,
    Form(fields): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    if let Err(code) = authorize(&state, &fields).await {
        return xml(error_list(code));
    }

    let record = record_values(&fields);
    let body = format!(
        r#"<response><result><form name="{}"><add><values>{}</values><status>Success</status></add></form></result></response>"#,
        escape(&form),
        field_list(&record)
    );
    debug!(application = %application, form = %form, "record added");
    state
        .db
        .write()
        .await
        .records
        .entry((application, form))
        .or_default()
        .push(record);
    xml(body)
}

async fn update_record(
    State(state): State<AppState>,
    Path((application, form)): Path<(String, String)>,
    Form(fields): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    if let Err(code) = authorize(&state, &fields).await {
        return xml(error_list(code));
    }
    let criteria_text = fields.get("criteria").map(String::as_str).unwrap_or_default();
    if criteria_text.trim().is_empty() {
        return xml(error_list("2907"));
    }
    if !matches!(
        fields.get("reloperator").map(String::as_str),
        None | Some("AND") | Some("OR")
    ) {
        return xml(error_list("2901"));
    }
    let criteria = match Criteria::parse(criteria_text) {
        Ok(criteria) => criteria,
        Err(code) => return xml(error_list(code)),
    };

    let changes = record_values(&fields);
    let mut db = state.db.write().await;
    let records = db.records.entry((application.clone(), form.clone())).or_default();
    let mut matched = 0;
    for record in records.iter_mut().filter(|record| criteria.matches(record)) {
        record.extend(changes.clone());
        matched += 1;
    }
    debug!(application = %application, form = %form, matched, "update applied");

    let status = if matched == 0 {
        NO_RECORDS_FOUND_STATUS
    } else {
        "Success"
    };
    xml(format!(
        r#"<response><result><form name="{}"><update><criteria>{}</criteria><newvalues>{}</newvalues><status>{}</status></update></form></result></response>"#,
        escape(&form),
        escape(criteria_text),
        field_list(&changes),
        status
    ))
}

async fn authorize(state: &AppState, fields: &HashMap<String, String>) -> Result<(), &'static str> {
    match fields.get("apikey").map(String::as_str) {
        None | Some("") => return Err("2831"),
        Some(key) if key != state.account.api_key => return Err("2890"),
        Some(_) => {}
    }
    let ticket = fields.get("ticket").map(String::as_str).unwrap_or_default();
    if ticket.is_empty() {
        return Err("2917");
    }
    if !state.db.read().await.tickets.contains(ticket) {
        return Err("2913");
    }
    Ok(())
}

fn record_values(fields: &HashMap<String, String>) -> Record {
    fields
        .iter()
        .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn field_list(record: &Record) -> String {
    record
        .iter()
        .map(|(key, value)| {
            format!(
                r#"<field name="{}"><value>{}</value></field>"#,
                escape(key),
                escape(value)
            )
        })
        .collect()
}

fn error_list(code: &str) -> String {
    format!("<response><errorlist><error><code>{code}</code></error></errorlist></response>")
}

fn xml(body: String) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/xml;charset=UTF-8")],
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n{body}"),
    )
}

/// A criteria expression of `Field == value` clauses joined uniformly by
/// `&&` (all must hold) or `||` (any may hold). Values may be quoted.
#[derive(Debug, PartialEq, Eq)]
struct Criteria {
    clauses: Vec<(String, String)>,
    any: bool,
}

impl Criteria {
    /// Returns the platform error code for an expression it cannot parse.
    fn parse(text: &str) -> Result<Self, &'static str> {
        let (parts, any): (Vec<&str>, bool) = match (text.contains("&&"), text.contains("||")) {
            (true, true) => return Err("2903"),
            (true, false) => (text.split("&&").collect(), false),
            (false, true) => (text.split("||").collect(), true),
            (false, false) => (vec![text], false),
        };
        let clauses = parts
            .into_iter()
            .map(|clause| {
                let clause = clause.trim().trim_start_matches('(').trim_end_matches(')');
                let (field, value) = clause.split_once("==").ok_or("2901")?;
                let field = field.trim();
                if field.is_empty() {
                    return Err("2900");
                }
                let value = value.trim().trim_matches('"');
                Ok((field.to_string(), value.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { clauses, any })
    }

    fn matches(&self, record: &Record) -> bool {
        let mut hits = self
            .clauses
            .iter()
            .map(|(field, value)| record.get(field) == Some(value));
        if self.any {
            hits.any(|hit| hit)
        } else {
            hits.all(|hit| hit)
        }
    }
}
