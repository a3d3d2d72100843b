use std::time::Duration;

/// Error type returned by this crate.
///
/// HTTP status codes are never turned into errors: 4xx and 5xx responses are
/// handed back as [`Response`](crate::Response) values for the caller to
/// interpret.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The target URL could not be parsed or is not `http`/`https`. Never
    /// retried.
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The default `reqwest` transport could not be built.
    #[error("failed to build http transport: {0}")]
    Build(#[source] reqwest::Error),
    /// Client configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Request parameters could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// Last transport failure observed once the retry budget ran out.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,
    /// The caller's deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Returns `true` when the call was aborted by its [`Context`](crate::Context).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns `true` when the last attempt failed because it hit the
    /// per-attempt timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }
}

/// Failure of a single send attempt at the transport level.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The attempt did not complete within the per-attempt timeout.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    /// Network or request execution error from `reqwest`.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// Failure reported by a custom [`Transport`](crate::Transport).
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps an arbitrary error raised by a custom transport.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(err.into())
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Reqwest(err) => err.is_timeout(),
            Self::Other(_) => false,
        }
    }
}
