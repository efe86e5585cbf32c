//! HTTP transport types and the transport seam.
//!
//! # Design
//! Requests and responses are described as plain data. `MailformClient`
//! builds `HttpRequest` values and parses `HttpResponse` values; a
//! `Transport` executes the round-trip in between. The default transport is
//! a blocking `reqwest` client, and tests substitute their own
//! implementation to observe exactly which requests were sent.
//!
//! A request body is the form to submit, not encoded bytes. The transport
//! turns it into `multipart/form-data` when the request goes out, so the
//! boundary and part framing belong to `reqwest::blocking::multipart`.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A file attached to a form under the part name `file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A `multipart/form-data` submission: text fields plus an optional file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    pub fields: BTreeMap<String, String>,
    pub file: Option<FilePart>,
}

impl FormBody {
    fn into_multipart(self) -> Result<Form, reqwest::Error> {
        let mut form = self
            .fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        if let Some(file) = self.file {
            let part = Part::bytes(file.data)
                .file_name(file.filename)
                .mime_str(&file.content_type)?;
            form = form.part("file", part);
        }
        Ok(form)
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<FormBody>,
}

impl HttpRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Executes an `HttpRequest` and returns the response as data.
///
/// Implementations must hand back 4xx/5xx responses as `Ok` so the client
/// can interpret the status itself. Only failures to complete the exchange
/// (DNS, connect, TLS, timeout, I/O) are errors.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a shared `reqwest::blocking::Client`.
///
/// The client pools connections internally and is safe to share between
/// threads, so one `ReqwestTransport` can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.multipart(body.clone().into_multipart()?);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();

        Ok(HttpResponse { status, body })
    }
}
