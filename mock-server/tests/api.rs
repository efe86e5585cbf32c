use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, MockState, DEFAULT_TOKEN, POSTAGE_CENTS, PRINTING_CENTS};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn valid_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("service", "USPS_STANDARD"),
        ("url", "https://example.com/letter.pdf"),
        ("to.name", "Jane"),
        ("to.address1", "1 Main St"),
        ("to.city", "Springfield"),
        ("to.state", "IL"),
        ("to.postcode", "62701"),
        ("to.country", "US"),
        ("from.name", "Acme"),
        ("from.address1", "2 Side St"),
        ("from.city", "Springfield"),
        ("from.state", "IL"),
        ("from.postcode", "62702"),
        ("from.country", "US"),
    ]
}

fn without(key: &str) -> Vec<(&'static str, &'static str)> {
    valid_fields().into_iter().filter(|(k, _)| *k != key).collect()
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn create_request(token: &str, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri("/orders")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(multipart_body(fields, file)))
        .unwrap()
}

fn get_request(token: &str, id: &str) -> Request<axum::body::Body> {
    Request::builder()
        .uri(format!("/orders/{id}"))
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn create_order_with_wrong_token_returns_401() {
    let resp = app()
        .oneshot(create_request("wrong", &valid_fields(), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn get_order_without_token_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/orders/anything")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- create ---

#[tokio::test]
async fn create_order_from_url() {
    let resp = app()
        .oneshot(create_request(DEFAULT_TOKEN, &valid_fields(), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["state"], "queued");
    assert_eq!(body["data"]["total"], POSTAGE_CENTS + PRINTING_CENTS);
    assert_eq!(body["data"]["lineitems"][0]["to"]["city"], "Springfield");
    assert!(body["data"]["id"].as_str().unwrap().starts_with("ord_"));
}

#[tokio::test]
async fn create_order_records_uploaded_file() {
    let state = MockState::new(DEFAULT_TOKEN, i64::MAX);
    let resp = app_with_state(state.clone())
        .oneshot(create_request(
            DEFAULT_TOKEN,
            &without("url"),
            Some(("letter.pdf", b"%PDF-1.4".as_slice())),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    let file = requests[0].file.as_ref().unwrap();
    assert_eq!(file.filename, "letter.pdf");
    assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(file.len, 8);
    assert!(!requests[0].fields.contains_key("url"));
}

#[tokio::test]
async fn create_order_without_document_fails_with_200() {
    let resp = app()
        .oneshot(create_request(DEFAULT_TOKEN, &without("url"), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "no_file_uploaded");
}

#[tokio::test]
async fn create_order_with_unknown_service_returns_400() {
    let mut fields = without("service");
    fields.push(("service", "CARRIER_PIGEON"));
    let resp = app()
        .oneshot(create_request(DEFAULT_TOKEN, &fields, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn create_order_with_missing_address_field_returns_400() {
    let resp = app()
        .oneshot(create_request(DEFAULT_TOKEN, &without("from.postcode"), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["detail"], "from.postcode is required");
}

#[tokio::test]
async fn create_order_without_funds_fails_with_200() {
    let state = MockState::new(DEFAULT_TOKEN, 10);
    let resp = app_with_state(state.clone())
        .oneshot(create_request(DEFAULT_TOKEN, &valid_fields(), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "unknown_error");
    assert_eq!(body["detail"], "Error: Not enough funds (2274:0)");
    assert_eq!(state.funds_cents(), 10);
}

#[tokio::test]
async fn create_order_with_out_of_range_amount_returns_400() {
    let state = MockState::new(DEFAULT_TOKEN, i64::MAX);
    let mut fields = valid_fields();
    fields.push(("amount", "9223372036854775807"));
    let resp = app_with_state(state.clone())
        .oneshot(create_request(DEFAULT_TOKEN, &fields, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "invalid_amount");
    assert_eq!(body["detail"], "amount is out of range");
    assert_eq!(state.funds_cents(), i64::MAX);
}

// --- get ---

#[tokio::test]
async fn get_unknown_order_fails_with_200() {
    let resp = app().oneshot(get_request(DEFAULT_TOKEN, "missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "erroroccurred");
    assert_eq!(body["error"]["message"], "not found");
}

// --- create then fetch ---

#[tokio::test]
async fn create_then_get() {
    use tower::Service;

    let state = MockState::new(DEFAULT_TOKEN, 1_000);
    let mut app = app_with_state(state.clone()).into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(create_request(DEFAULT_TOKEN, &valid_fields(), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(DEFAULT_TOKEN, &id))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["data"], created["data"]);

    let requests = state.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, format!("/orders/{id}"));
    assert_eq!(state.funds_cents(), 1_000 - POSTAGE_CENTS - PRINTING_CENTS);
}
