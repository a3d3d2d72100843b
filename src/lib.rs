//! `retrying-http` is a small async HTTP client that retries transient
//! failures.
//!
//! Requests are built by convenience encoders and sent through an injectable
//! [`Transport`]:
//! - [`Client::get`] appends parameters to the query string
//! - [`Client::post_json`] / [`Client::put_json`] send a JSON object body
//! - [`Client::post_form`] / [`Client::put_form`] send a form-encoded body
//!
//! Transport errors, per-attempt timeouts and 5xx responses are retried up to
//! the configured budget. Any other response, 4xx included, is returned as-is.
//! Every verb has a `_with_ctx` twin taking a [`Context`] that aborts the call
//! when cancelled or past its deadline.
//!
//! ```no_run
//! use retrying_http::{Client, HeaderMap};
//!
//! # async fn run() -> retrying_http::Result<()> {
//! let client = Client::new();
//! let response = client
//!     .get("https://example.com/search", [("q", "ohana")], &HeaderMap::new())
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod context;
pub mod encode;
mod error;
mod options;
mod params;
mod request;
mod retry;
mod transport;

pub use client::Client;
pub use context::Context;
pub use error::{ClientError, TransportError};
pub use options::{ClientOptions, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS};
pub use params::{JsonParams, Params};
pub use request::{Request, Response};
pub use transport::{ReqwestTransport, Transport};

pub use reqwest::{header::HeaderMap, Method, StatusCode, Url};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, ClientError>;
