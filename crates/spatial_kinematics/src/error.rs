//! Error types for the engine and the producer-side bridge.

use crate::protocol::RequestToken;
use std::time::Duration;

/// Errors raised while servicing a single request.
///
/// None of these are fatal: the engine converts each into an `error`
/// response for the offending request and keeps serving.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The request's `type` is not a recognized kind
    #[error("Unknown request kind: {0}")]
    UnknownRequest(String),
    /// The message is not a request object at all
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    /// A known request kind carried a payload that failed to decode
    #[error("Malformed {kind} request: {reason}")]
    MalformedPayload { kind: String, reason: String },
    /// A request other than `init` reached an uninitialized engine
    #[error("Engine not initialized: send an init request before {0}")]
    NotInitialized(String),
    /// A numeric or structural argument failed validation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A fault escaped the request handler and was caught at the dispatch boundary
    #[error("Internal engine fault: {0}")]
    Internal(String),
}

/// Errors seen by producers talking to the engine through [`crate::EngineBridge`].
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The engine answered with an `error` response
    #[error("Engine error: {0}")]
    Engine(String),
    /// No response arrived within the allotted time; the token has been abandoned
    #[error("Request {token} timed out after {timeout:?}")]
    Timeout { token: RequestToken, timeout: Duration },
    /// The engine worker is gone or the bridge has been shut down
    #[error("Engine worker disconnected")]
    Disconnected,
    /// The engine worker panicked outside the dispatch boundary
    #[error("Engine worker terminated abnormally")]
    WorkerPanicked,
    /// The bridge was created outside a Tokio runtime
    #[error("No Tokio runtime available to route engine responses")]
    NoRuntime,
    /// The worker thread could not be started
    #[error("Failed to spawn engine worker: {0}")]
    Spawn(#[from] std::io::Error),
    /// The engine configuration failed validation
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
    /// A raw request could not be submitted
    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),
    /// The engine answered with a response of the wrong kind
    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: &'static str,
    },
}
