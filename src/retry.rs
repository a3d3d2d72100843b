//! Send-with-retry executor shared by every [`Client`](crate::Client) verb.

use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::{ClientError, Context, Request, Response, Result, Transport, TransportError};

/// Resolved retry settings of a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_retries: usize,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
}

/// Result of one send attempt.
pub(crate) type Outcome = std::result::Result<Response, TransportError>;

/// Transport errors and 5xx responses are worth another attempt. Any other
/// response, 4xx included, is final. So is a request `reqwest` refuses to
/// build, such as one with an unsupported scheme.
pub(crate) fn is_transient(outcome: &Outcome) -> bool {
    match outcome {
        Ok(response) => response.status().is_server_error(),
        Err(TransportError::Reqwest(err)) => !err.is_builder(),
        Err(_) => true,
    }
}

/// Sends `request` until it yields a non-transient outcome, the retry budget
/// runs out, or `ctx` fires.
///
/// When the budget runs out the last outcome is returned as observed: a 5xx
/// response comes back as `Ok`, a transport failure as
/// [`ClientError::Transport`].
pub(crate) async fn execute(
    transport: &dyn Transport,
    policy: &RetryPolicy,
    ctx: &Context,
    request: &Request,
) -> Result<Response> {
    let mut attempt = 0usize;
    loop {
        ctx.check()?;

        let outcome = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            outcome = send_attempt(transport, request, policy.attempt_timeout) => outcome,
        };

        if !is_transient(&outcome) || attempt >= policy.max_retries {
            #[cfg(feature = "tracing")]
            if is_transient(&outcome) && policy.max_retries > 0 {
                tracing::warn!(
                    method = %request.method,
                    url = %request.url,
                    attempts = attempt + 1,
                    "retries exhausted, returning last outcome"
                );
            }
            return outcome.map_err(ClientError::Transport);
        }

        #[cfg(feature = "tracing")]
        match &outcome {
            Ok(response) => tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                status = response.status().as_u16(),
                "server error, retrying"
            ),
            Err(err) => tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                error = %err,
                "transport error, retrying"
            ),
        }

        // Release the discarded response before the next attempt.
        drop(outcome);
        wait_before_retry(ctx, policy.retry_delay).await?;
        attempt += 1;
    }
}

async fn send_attempt(
    transport: &dyn Transport,
    request: &Request,
    attempt_timeout: Duration,
) -> Outcome {
    match timeout(attempt_timeout, transport.send(request)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(TransportError::Timeout(attempt_timeout)),
    }
}

async fn wait_before_retry(ctx: &Context, delay: Duration) -> Result<()> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        err = ctx.done() => Err(err),
        _ = sleep(delay) => Ok(()),
    }
}
