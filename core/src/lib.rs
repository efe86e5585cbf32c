//! Blocking client for the mailform print-and-mail API.
//!
//! # Overview
//! Validates order input, encodes it as a `multipart/form-data` submission
//! with an optional PDF attachment, sends it with bearer authentication and
//! turns the service's responses into `Order` values or a typed
//! `MailformError`.
//!
//! # Design
//! - `MailformClient` is immutable after construction; it holds the token,
//!   the base URL and a `Transport`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_order` (consumes response), so the I/O boundary is explicit and
//!   the default `reqwest` transport can be swapped out.
//! - The service can report failures inside a 200 response. Every response
//!   below 400 goes through `check_body_for_error` before it is decoded.
//! - No retries, queueing or caching: callers own that policy.
//!
//! ```no_run
//! use mailform::{Config, MailformClient, OrderInput};
//!
//! let client = MailformClient::new(Some(Config::new("token")))?;
//! let order = client.create_order(&OrderInput {
//!     url: "https://example.com/letter.pdf".into(),
//!     service: "USPS_FIRST_CLASS".into(),
//!     to_name: "Jane Doe".into(),
//!     to_address1: "1 Main St".into(),
//!     to_city: "Springfield".into(),
//!     to_state: "IL".into(),
//!     to_postcode: "62701".into(),
//!     to_country: "US".into(),
//!     from_name: "Acme".into(),
//!     from_address1: "2 Side St".into(),
//!     from_city: "Springfield".into(),
//!     from_state: "IL".into(),
//!     from_postcode: "62702".into(),
//!     from_country: "US".into(),
//!     ..Default::default()
//! })?;
//! println!("created {}", order.id());
//! # Ok::<(), mailform::MailformError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod order;
pub mod types;

pub use client::{check_body_for_error, MailformClient};
pub use config::{Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ErrorBody, ErrorEnvelope, InvalidOrder, MailformError, TransportError};
pub use http::{FilePart, FormBody, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use order::{OrderInput, ServiceCode};
pub use types::{Address, LineItem, Order, OrderData, OrderStatus, PricingEntry};
