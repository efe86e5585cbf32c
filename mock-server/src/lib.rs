//! In-process stand-in for the mailform orders API.
//!
//! Speaks the subset of the wire protocol the client uses, including the
//! service's habit of answering 200 with an error envelope. Every request is
//! recorded so tests can count calls and inspect submitted form fields.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Multipart, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "test-token";
pub const POSTAGE_CENTS: i64 = 60;
pub const PRINTING_CENTS: i64 = 45;

const SERVICE_CODES: [&str; 9] = [
    "FEDEX_OVERNIGHT",
    "USPS_PRIORITY_EXPRESS",
    "USPS_PRIORITY",
    "USPS_CERTIFIED_PHYSICAL_RECEIPT",
    "USPS_CERTIFIED_RECEIPT",
    "USPS_CERTIFIED",
    "USPS_FIRST_CLASS",
    "USPS_STANDARD",
    "USPS_POSTCARD",
];

const REQUIRED_ADDRESS_FIELDS: [&str; 6] = ["name", "address1", "city", "state", "postcode", "country"];

/// An uploaded file as seen by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub len: usize,
}

/// One request received by the server.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub fields: BTreeMap<String, String>,
    pub file: Option<UploadedFile>,
}

/// Shared server state.
pub struct MockState {
    token: String,
    funds_cents: Mutex<i64>,
    orders: RwLock<HashMap<String, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    pub fn new(token: impl Into<String>, funds_cents: i64) -> Arc<Self> {
        Arc::new(Self {
            token: token.into(),
            funds_cents: Mutex::new(funds_cents),
            orders: RwLock::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn funds_cents(&self) -> i64 {
        self.funds_cents.lock().map(|f| *f).unwrap_or_default()
    }

    fn record(&self, request: RecordedRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }

    fn authorized(&self, authorization: Option<&str>) -> bool {
        authorization == Some(format!("Bearer {}", self.token).as_str())
    }

    // Debits `price` if the balance covers it.
    fn charge(&self, price: i64) -> bool {
        match self.funds_cents.lock() {
            Ok(mut funds) if *funds >= price => {
                *funds -= price;
                true
            }
            _ => false,
        }
    }
}

pub type Db = Arc<MockState>;

/// Router with the default token and enough funds for any test.
pub fn app() -> Router {
    app_with_state(MockState::new(DEFAULT_TOKEN, i64::MAX))
}

pub fn app_with_state(state: Db) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, MockState::new(DEFAULT_TOKEN, i64::MAX)).await
}

pub async fn serve(listener: TcpListener, state: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// `{"error": {...}, "detail": ...}` as sent by the service.
pub fn error_body(code: &str, message: &str, detail: Option<&str>) -> Value {
    let mut body = json!({ "error": { "code": code, "message": message } });
    if let Some(detail) = detail {
        body["detail"] = json!(detail);
    }
    body
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn create_order(State(state): State<Db>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let authorization = authorization(&headers);
    let mut fields = BTreeMap::new();
    let mut file = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return err.into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            match field.bytes().await {
                Ok(bytes) => {
                    file = Some(UploadedFile {
                        filename,
                        content_type,
                        len: bytes.len(),
                    })
                }
                Err(err) => return err.into_response(),
            }
        } else {
            match field.text().await {
                Ok(text) => {
                    fields.insert(name, text);
                }
                Err(err) => return err.into_response(),
            }
        }
    }

    state.record(RecordedRequest {
        method: "POST".to_string(),
        path: "/orders".to_string(),
        authorization: authorization.clone(),
        fields: fields.clone(),
        file: file.clone(),
    });
    debug!(fields = fields.len(), has_file = file.is_some(), "create order request");

    if !state.authorized(authorization.as_deref()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let field = |key: &str| fields.get(key).map(String::as_str).unwrap_or_default();

    if file.is_none() && field("url").is_empty() {
        return Json(error_body("erroroccurred", "no_file_uploaded", None)).into_response();
    }

    if !SERVICE_CODES.contains(&field("service")) {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body("invalid_request", "invalid_service", None)),
        )
            .into_response();
    }

    for side in ["to", "from"] {
        for part in REQUIRED_ADDRESS_FIELDS {
            let key = format!("{side}.{part}");
            if field(&key).is_empty() {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(error_body(
                        "invalid_request",
                        "missing_field",
                        Some(&format!("{key} is required")),
                    )),
                )
                    .into_response();
            }
        }
    }

    let amount = field("amount").parse::<i64>().unwrap_or_default();
    let Some(total) = (POSTAGE_CENTS + PRINTING_CENTS).checked_add(amount) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body(
                "invalid_request",
                "invalid_amount",
                Some("amount is out of range"),
            )),
        )
            .into_response();
    };
    if !state.charge(total) {
        return Json(error_body(
            "erroroccurred",
            "unknown_error",
            Some("Error: Not enough funds (2274:0)"),
        ))
        .into_response();
    }

    let id = format!("ord_{}", Uuid::new_v4().simple());
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let order = json!({
        "object": "order",
        "id": id,
        "created": now,
        "modified": now,
        "total": total,
        "webhook": field("webhook"),
        "lineitems": [{
            "id": format!("li_{}", Uuid::new_v4().simple()),
            "pagecount": 1,
            "to": address(&fields, "to"),
            "from": address(&fields, "from"),
            "simplex": field("simplex") == "true",
            "color": field("color") == "true",
            "service": field("service"),
            "pricing": [
                { "type": "postage", "value": POSTAGE_CENTS },
                { "type": "printing", "value": PRINTING_CENTS }
            ]
        }],
        "account": "acct_mock",
        "customer_reference": field("customer_reference"),
        "channel": "api",
        "test_mode": true,
        "state": "queued",
        "cancelled": null,
        "cancellation_reason": ""
    });

    state.orders.write().await.insert(id.clone(), order.clone());
    info!(%id, total, "order created");
    Json(json!({ "success": true, "data": order })).into_response()
}

async fn get_order(State(state): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let authorization = authorization(&headers);
    state.record(RecordedRequest {
        method: "GET".to_string(),
        path: format!("/orders/{id}"),
        authorization: authorization.clone(),
        fields: BTreeMap::new(),
        file: None,
    });

    if !state.authorized(authorization.as_deref()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match state.orders.read().await.get(&id) {
        Some(order) => Json(json!({ "success": true, "data": order })).into_response(),
        None => Json(error_body("erroroccurred", "not found", None)).into_response(),
    }
}

fn address(fields: &BTreeMap<String, String>, side: &str) -> Value {
    let get = |part: &str| {
        fields
            .get(&format!("{side}.{part}"))
            .cloned()
            .unwrap_or_default()
    };
    let formatted = [get("name"), get("address1"), get("city"), get("country")]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    json!({
        "name": get("name"),
        "organization": get("organization"),
        "address1": get("address1"),
        "address2": get("address2"),
        "city": get("city"),
        "state": get("state"),
        "postcode": get("postcode"),
        "country": get("country"),
        "formatted": formatted,
    })
}
