use std::{fmt, str::FromStr, sync::Arc};

use crate::{ClientError, Result, Transport};

/// Default retry budget: up to three re-sends after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Default pause between attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 0;

const ENV_MAX_RETRIES: &str = "RETRYING_HTTP_MAX_RETRIES";
const ENV_TIMEOUT_MS: &str = "RETRYING_HTTP_TIMEOUT_MS";
const ENV_RETRY_DELAY_MS: &str = "RETRYING_HTTP_RETRY_DELAY_MS";

/// Configures timeout, retry behavior and the transport of a [`Client`](crate::Client).
///
/// Fields not set explicitly keep their defaults:
///
/// ```
/// use retrying_http::ClientOptions;
///
/// let opts = ClientOptions {
///     max_retries: 5,
///     ..ClientOptions::default()
/// };
/// assert_eq!(opts.timeout_ms, retrying_http::DEFAULT_TIMEOUT_MS);
/// ```
#[derive(Clone)]
pub struct ClientOptions {
    /// Maximum number of retries after the initial attempt. `0` disables retries.
    pub max_retries: usize,
    /// Per-attempt timeout in milliseconds. `0` falls back to the default.
    pub timeout_ms: u64,
    /// Fixed pause between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Transport used to send requests. `None` builds the default `reqwest` transport.
    pub transport: Option<Arc<dyn Transport>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            transport: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("max_retries", &self.max_retries)
            .field("timeout_ms", &self.timeout_ms)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field(
                "transport",
                &self.transport.as_ref().map(|_| "<custom>").unwrap_or("<default>"),
            )
            .finish()
    }
}

impl ClientOptions {
    /// Loads options from environment variables.
    ///
    /// Reads:
    /// - `RETRYING_HTTP_MAX_RETRIES`
    /// - `RETRYING_HTTP_TIMEOUT_MS`
    /// - `RETRYING_HTTP_RETRY_DELAY_MS`
    ///
    /// Unset or blank variables keep their defaults. A value that is not a
    /// non-negative integer is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();
        if let Some(value) = read_number(&lookup, ENV_MAX_RETRIES)? {
            opts.max_retries = value;
        }
        if let Some(value) = read_number(&lookup, ENV_TIMEOUT_MS)? {
            opts.timeout_ms = value;
        }
        if let Some(value) = read_number(&lookup, ENV_RETRY_DELAY_MS)? {
            opts.retry_delay_ms = value;
        }
        Ok(opts)
    }

    /// Replaces the transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub(crate) fn effective_timeout_ms(&self) -> u64 {
        if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout_ms
        }
    }
}

fn read_number<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|err| ClientError::Config(format!("{key}={trimmed:?}: {err}")))
}
