//! Pluggable network transport.
//!
//! The [`Client`](crate::Client) owns one [`Transport`] for its lifetime and
//! shares it between concurrent calls, so implementations must be safe to use
//! from many tasks at once. [`ReqwestTransport`] is the default.

use std::fmt;

use async_trait::async_trait;

use crate::{ClientError, Request, Response, TransportError};

/// Sends a single request and returns the buffered response.
///
/// Implementations perform exactly one attempt: retries, per-attempt timeouts
/// and cancellation are applied by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

/// Transport backed by a pooled [`reqwest::Client`].
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Creates a transport with `reqwest` defaults.
    ///
    /// Panics if the TLS backend cannot be initialized, like
    /// [`reqwest::Client::new`]. Use [`ReqwestTransport::try_new`] to get an
    /// error instead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport with `reqwest` defaults, reporting builder failures.
    pub fn try_new() -> Result<Self, ClientError> {
        reqwest::Client::builder()
            .build()
            .map(Self::from_client)
            .map_err(ClientError::Build)
    }

    /// Wraps a preconfigured `reqwest` client (proxies, TLS roots, pool sizing).
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(status, headers, body))
    }
}
