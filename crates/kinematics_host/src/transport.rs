//! Newline-delimited JSON transport.
//!
//! Reads one JSON request per line, submits each to the engine bridge as
//! soon as it is read and writes one JSON response per line in completion
//! order. Blank lines are skipped; lines that are not JSON get an `error`
//! response without a token.

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use spatial_kinematics::{EngineBridge, EngineResponse, PendingResponse, RequestToken, ResponseEnvelope};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Counters reported when the input is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Non-blank lines read
    pub requests: u64,
    /// Responses written
    pub responses: u64,
    /// Responses of kind `error`
    pub errors: u64,
}

/// Serves requests from `reader` until end of input, writing responses to `writer`.
///
/// Requests are in flight concurrently; every request read is answered
/// before this returns.
pub async fn serve<R, W>(bridge: &EngineBridge, reader: R, mut writer: W) -> anyhow::Result<TransportStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let timeout = bridge.default_timeout();
    let mut stats = TransportStats::default();
    let mut lines = reader.lines();
    let mut in_flight: FuturesUnordered<BoxFuture<'_, ResponseEnvelope>> = FuturesUnordered::new();
    let mut reading = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if reading => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    stats.requests += 1;
                    in_flight.push(settle(submit(bridge, &line), timeout).boxed());
                }
                None => {
                    debug!("input exhausted with {} requests in flight", in_flight.len());
                    reading = false;
                }
            },
            Some(envelope) = in_flight.next(), if !in_flight.is_empty() => {
                if envelope.response.is_error() {
                    stats.errors += 1;
                }
                write_envelope(&mut writer, &envelope).await?;
                stats.responses += 1;
            },
            else => break,
        }
    }

    writer.flush().await?;
    Ok(stats)
}

/// Hands one input line to the bridge.
///
/// Submission happens here, synchronously, so requests reach the engine in
/// input order. Lines that cannot be submitted are answered immediately.
fn submit(bridge: &EngineBridge, line: &str) -> Result<PendingResponse, ResponseEnvelope> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!("ignoring malformed input line: {}", e);
        ResponseEnvelope {
            token: None,
            response: EngineResponse::error(format!("Malformed request: {e}")),
        }
    })?;

    let token = value.get("token").and_then(Value::as_str).map(RequestToken::from);
    bridge.dispatch_value(value).map_err(|e| ResponseEnvelope {
        token,
        response: EngineResponse::error(e),
    })
}

/// Waits for a submitted request, turning bridge failures into `error` responses.
async fn settle(submission: Result<PendingResponse, ResponseEnvelope>, timeout: Duration) -> ResponseEnvelope {
    let pending = match submission {
        Ok(pending) => pending,
        Err(rejection) => return rejection,
    };

    let token = pending.token().clone();
    match pending.wait_timeout(timeout).await {
        Ok(envelope) => envelope,
        Err(e) => ResponseEnvelope {
            token: Some(token),
            response: EngineResponse::error(e),
        },
    }
}

async fn write_envelope<W>(writer: &mut W, envelope: &ResponseEnvelope) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(envelope)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
