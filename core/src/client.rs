//! Blocking client for the mailform orders API.
//!
//! # Design
//! `MailformClient` holds the bearer token, the base URL and a `Transport`,
//! and carries no mutable state between calls. Each operation is split into
//! a `build_*` method that produces an `HttpRequest` and `parse_order`,
//! which consumes the `HttpResponse`. `create_order` and `get_order` run
//! build, execute and parse in one call.
//!
//! Response classification:
//! - 401: always the synthetic `unauthorized` envelope, the body is ignored.
//! - other status >= 400: the body decoded as an `ErrorEnvelope`.
//! - anything else: the body is checked for an in-body error envelope
//!   (the service can answer 200 with a failure payload), then decoded as
//!   an `Order`.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ErrorEnvelope, MailformError};
use crate::http::{FilePart, FormBody, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::order::OrderInput;
use crate::types::Order;

const ORDERS_ENDPOINT: &str = "/orders";

/// Client for the mailform REST API.
///
/// Safe to share between threads when the transport is; the default
/// `ReqwestTransport` is.
#[derive(Debug, Clone)]
pub struct MailformClient<T = ReqwestTransport> {
    token: String,
    base_url: String,
    timeout: Duration,
    transport: T,
}

impl MailformClient {
    /// Build a client over a blocking `reqwest` client. No network I/O
    /// happens here.
    ///
    /// Fails with `MailformError::NilConfig` when `config` is `None`.
    pub fn new(config: Option<Config>) -> Result<Self, MailformError> {
        let config = config.ok_or(MailformError::NilConfig)?;
        let transport = ReqwestTransport::new(config.resolved_timeout())?;
        Ok(Self::from_config(config, transport))
    }
}

impl<T: Transport> MailformClient<T> {
    /// Build a client that sends its requests through `transport`.
    pub fn with_transport(config: Option<Config>, transport: T) -> Result<Self, MailformError> {
        let config = config.ok_or(MailformError::NilConfig)?;
        Ok(Self::from_config(config, transport))
    }

    fn from_config(config: Config, transport: T) -> Self {
        Self {
            base_url: config.resolved_base_url().to_string(),
            timeout: config.resolved_timeout(),
            token: config.token,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate `input` and create the order.
    ///
    /// Invalid input is rejected without sending anything.
    pub fn create_order(&self, input: &OrderInput) -> Result<Order, MailformError> {
        let request = self.build_create_order(input)?;
        let response = self.send(&request)?;
        self.parse_order(response)
    }

    /// Fetch an order by id.
    pub fn get_order(&self, id: &str) -> Result<Order, MailformError> {
        let request = self.build_get_order(id);
        let response = self.send(&request)?;
        self.parse_order(response)
    }

    /// Build the `POST /orders` request.
    ///
    /// Validates `input`, encodes its form fields and, when `file_path` is
    /// set, reads the file into a `file` part.
    pub fn build_create_order(&self, input: &OrderInput) -> Result<HttpRequest, MailformError> {
        input.validate()?;

        let file = input.file_path.as_deref().map(read_attachment).transpose()?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(ORDERS_ENDPOINT),
            headers: vec![self.authorization()],
            body: Some(FormBody {
                fields: input.form_data(),
                file,
            }),
        })
    }

    /// Build the `GET /orders/{id}` request.
    pub fn build_get_order(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(&format!("{ORDERS_ENDPOINT}/{id}")),
            headers: vec![self.authorization()],
            body: None,
        }
    }

    /// Classify a response from either orders endpoint.
    pub fn parse_order(&self, response: HttpResponse) -> Result<Order, MailformError> {
        if response.status == 401 {
            warn!(status = response.status, "mailform rejected credentials");
            return Err(ErrorEnvelope::unauthorized().into());
        }

        if response.status >= 400 {
            let envelope = status_envelope(&response);
            warn!(status = response.status, code = envelope.code(), error = %envelope, "mailform returned an error");
            return Err(envelope.into());
        }

        check_body_for_error(&response.body)?;
        let order: Option<Order> = serde_json::from_slice(&response.body)?;
        Ok(order.unwrap_or_default())
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MailformError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending mailform request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, bytes = response.body.len(), "received mailform response");
        Ok(response)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn authorization(&self) -> (String, String) {
        ("Authorization".to_string(), format!("Bearer {}", self.token))
    }
}

/// Detect a failure payload in a response body.
///
/// Returns the decode error when `body` is not JSON, an `Upstream` error
/// when it carries a non-empty `error.message`, and `Ok` otherwise. A JSON
/// `null` body carries no error.
pub fn check_body_for_error(body: &[u8]) -> Result<(), MailformError> {
    let envelope: Option<ErrorEnvelope> = serde_json::from_slice(body)?;
    if let Some(envelope) = envelope.filter(ErrorEnvelope::is_error) {
        warn!(code = envelope.code(), error = %envelope, "mailform reported an error in a successful response");
        return Err(envelope.into());
    }
    Ok(())
}

// Bodies that carry no usable message are reported by status.
fn status_envelope(response: &HttpResponse) -> ErrorEnvelope {
    let mut envelope: ErrorEnvelope = serde_json::from_slice(&response.body).unwrap_or_default();
    if envelope.is_error() || !envelope.detail.is_empty() {
        return envelope;
    }
    if envelope.error.code.is_empty() {
        envelope.error.code = response.status.to_string();
    }
    envelope.error.message = format!("http status {}", response.status);
    envelope
}

fn read_attachment(path: &Path) -> Result<FilePart, MailformError> {
    let data = std::fs::read(path).map_err(|source| MailformError::Attachment {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    Ok(FilePart {
        filename,
        content_type: "application/pdf".to_string(),
        data,
    })
}
