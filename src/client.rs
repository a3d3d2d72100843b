use std::{fmt, sync::Arc, time::Duration};

use reqwest::{header::HeaderMap, Method};

use crate::{
    encode::{form_request, json_request, query_request},
    retry::{self, RetryPolicy},
    ClientOptions, Context, JsonParams, Params, ReqwestTransport, Request, Response, Result,
    Transport, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS,
};

#[derive(Clone)]
/// HTTP client that retries transient failures.
///
/// Every verb comes in two forms: a plain one that runs to completion (modulo
/// the per-attempt timeout) and a `_with_ctx` one that also stops when the
/// caller's [`Context`] fires. Both share the same encoders and retry logic.
///
/// Clones share the underlying transport and connection pool. Calls never
/// share retry state, so one client can serve many tasks at once.
pub struct Client {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("max_retries", &self.policy.max_retries)
            .field("attempt_timeout", &self.policy.attempt_timeout)
            .field("retry_delay", &self.policy.retry_delay)
            .finish_non_exhaustive()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client with default retry budget, timeout and transport.
    pub fn new() -> Self {
        Self::custom(DEFAULT_MAX_RETRIES, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Creates a client with an explicit retry budget and per-attempt timeout.
    ///
    /// A zero `timeout` falls back to the default.
    pub fn custom(max_retries: usize, timeout: Duration) -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new()),
            policy: default_policy(max_retries, timeout),
        }
    }

    /// Creates a client that sends through `transport` with default settings.
    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            policy: default_policy(
                DEFAULT_MAX_RETRIES,
                Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ),
        }
    }

    /// Creates a client from a full set of options.
    ///
    /// A zero `timeout_ms` falls back to the default. Without an explicit
    /// transport the default `reqwest` transport is built, which is the only
    /// way this can fail.
    pub fn with_options(opts: ClientOptions) -> Result<Self> {
        let attempt_timeout = Duration::from_millis(opts.effective_timeout_ms());
        let transport = match opts.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::try_new()?),
        };

        Ok(Self {
            transport,
            policy: RetryPolicy {
                max_retries: opts.max_retries,
                attempt_timeout,
                retry_delay: Duration::from_millis(opts.retry_delay_ms),
            },
        })
    }

    /// Creates a client from environment variables.
    ///
    /// See [`ClientOptions::from_env`] for the variables read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retrying_http::Client;
    ///
    /// let client = Client::from_env().expect("invalid RETRYING_HTTP_* env vars");
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::with_options(ClientOptions::from_env()?)
    }

    pub fn max_retries(&self) -> usize {
        self.policy.max_retries
    }

    pub fn timeout(&self) -> Duration {
        self.policy.attempt_timeout
    }

    /// Sends a `GET` request with `params` appended to the query string.
    pub async fn get<P: Into<Params>>(
        &self,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        self.get_with_ctx(&Context::background(), url, params, headers)
            .await
    }

    pub async fn get_with_ctx<P: Into<Params>>(
        &self,
        ctx: &Context,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let request = query_request(url, &params.into(), headers)?;
        self.execute_with_ctx(ctx, &request).await
    }

    /// Sends a `POST` request with a JSON object body.
    ///
    /// Empty `params` send no body at all.
    pub async fn post_json<P: Into<JsonParams>>(
        &self,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        self.post_json_with_ctx(&Context::background(), url, params, headers)
            .await
    }

    pub async fn post_json_with_ctx<P: Into<JsonParams>>(
        &self,
        ctx: &Context,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let request = json_request(Method::POST, url, &params.into(), headers)?;
        self.execute_with_ctx(ctx, &request).await
    }

    /// Sends a `PUT` request with a JSON object body.
    ///
    /// Empty `params` send no body at all.
    pub async fn put_json<P: Into<JsonParams>>(
        &self,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        self.put_json_with_ctx(&Context::background(), url, params, headers)
            .await
    }

    pub async fn put_json_with_ctx<P: Into<JsonParams>>(
        &self,
        ctx: &Context,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let request = json_request(Method::PUT, url, &params.into(), headers)?;
        self.execute_with_ctx(ctx, &request).await
    }

    /// Sends a `POST` request with a form-encoded body.
    pub async fn post_form<P: Into<Params>>(
        &self,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        self.post_form_with_ctx(&Context::background(), url, params, headers)
            .await
    }

    pub async fn post_form_with_ctx<P: Into<Params>>(
        &self,
        ctx: &Context,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let request = form_request(Method::POST, url, &params.into(), headers)?;
        self.execute_with_ctx(ctx, &request).await
    }

    /// Sends a `PUT` request with a form-encoded body.
    pub async fn put_form<P: Into<Params>>(
        &self,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        self.put_form_with_ctx(&Context::background(), url, params, headers)
            .await
    }

    pub async fn put_form_with_ctx<P: Into<Params>>(
        &self,
        ctx: &Context,
        url: &str,
        params: P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let request = form_request(Method::PUT, url, &params.into(), headers)?;
        self.execute_with_ctx(ctx, &request).await
    }

    /// Sends a prebuilt request under this client's retry policy.
    ///
    /// The body is re-sent unchanged on every attempt.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        self.execute_with_ctx(&Context::background(), request).await
    }

    pub async fn execute_with_ctx(&self, ctx: &Context, request: &Request) -> Result<Response> {
        retry::execute(self.transport.as_ref(), &self.policy, ctx, request).await
    }
}

fn default_policy(max_retries: usize, attempt_timeout: Duration) -> RetryPolicy {
    let attempt_timeout = if attempt_timeout.is_zero() {
        Duration::from_millis(DEFAULT_TIMEOUT_MS)
    } else {
        attempt_timeout
    };
    RetryPolicy {
        max_retries,
        attempt_timeout,
        retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use reqwest::{header::HeaderMap, StatusCode};

    use super::Client;
    use crate::{
        ClientError, ClientOptions, Context, Request, Response, Transport, TransportError,
        DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS,
    };

    #[derive(Default)]
    struct RecordingTransport {
        hits: AtomicUsize,
        last: Mutex<Option<Request>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: &Request) -> Result<Response, TransportError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().expect("request slot must not be poisoned") = Some(request.clone());
            Ok(Response::new(StatusCode::CREATED, HeaderMap::new(), "{}"))
        }
    }

    #[test]
    fn constructors_apply_settings() {
        let client = Client::new();
        assert_eq!(client.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(client.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));

        let client = Client::custom(5, Duration::from_secs(3));
        assert_eq!(client.max_retries(), 5);
        assert_eq!(client.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn custom_with_zero_timeout_uses_default() {
        let client = Client::custom(1, Duration::ZERO);
        assert_eq!(client.max_retries(), 1);
        assert_eq!(client.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn non_http_scheme_never_reaches_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let client = Client::from_transport(transport.clone());

        for url in ["ftp://example.com/x", "mailto:a@b.c"] {
            let err = client
                .get(url, (), &HeaderMap::new())
                .await
                .expect_err("scheme must be rejected");
            assert!(matches!(err, ClientError::InvalidUrl { .. }), "{url}: {err:?}");
        }
        assert_eq!(transport.hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn with_options_keeps_zero_retries_and_defaults_zero_timeout() {
        let client = Client::with_options(ClientOptions {
            max_retries: 0,
            timeout_ms: 0,
            ..ClientOptions::default()
        })
        .expect("default transport must build");
        assert_eq!(client.max_retries(), 0);
        assert_eq!(client.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn debug_lists_policy() {
        let debug = format!("{:?}", Client::custom(2, Duration::from_secs(1)));
        assert!(debug.contains("max_retries: 2"));
    }

    #[tokio::test]
    async fn verbs_share_one_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let client = Client::with_options(
            ClientOptions::default().with_transport(transport.clone()),
        )
        .expect("custom transport never fails");

        let headers = HeaderMap::new();
        client
            .post_json("https://dummy.com", [("ohana", "family")], &headers)
            .await
            .expect("post must succeed");
        client
            .put_form("https://dummy.com", [("ohana", "family")], &headers)
            .await
            .expect("put must succeed");

        assert_eq!(transport.hits.load(Ordering::SeqCst), 2);
        let last = transport
            .last
            .lock()
            .expect("request slot must not be poisoned")
            .clone()
            .expect("a request must be recorded");
        assert_eq!(last.method, reqwest::Method::PUT);
        assert_eq!(last.body.as_deref(), Some(&b"ohana=family"[..]));
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let client = Client::from_transport(transport.clone());

        let err = client
            .get("://missing-scheme", (), &HeaderMap::new())
            .await
            .expect_err("url must not parse");

        assert!(matches!(err, ClientError::InvalidUrl { .. }));
        assert_eq!(transport.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_ctx_skips_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let client = Client::from_transport(transport.clone());
        let ctx = Context::background();
        ctx.cancel();

        let err = client
            .post_json_with_ctx(&ctx, "https://dummy.com", (), &HeaderMap::new())
            .await
            .expect_err("cancelled ctx must abort");

        assert!(err.is_cancellation());
        assert_eq!(transport.hits.load(Ordering::SeqCst), 0);
    }
}
