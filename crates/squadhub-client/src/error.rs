//! Error types for squadhub-client.

use std::time::Duration;

use squadhub_proto::{GatewayError, ProtoError};
use thiserror::Error;

/// Errors surfaced by the gateway client, the shared manager and the context.
///
/// `Clone` so that one connect outcome can be handed to every caller waiting
/// on the same attempt.
#[derive(Debug, Clone, Error)]
pub enum GatewayClientError {
    /// The transport could not be opened (refused, DNS, TLS, bad URL).
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// The connect handshake did not complete.
    #[error("gateway handshake failed: {0}")]
    Handshake(String),

    /// The gateway refused the connect request.
    #[error("gateway rejected connection: {0}")]
    AuthRejected(GatewayError),

    /// A frame could not be produced, or a call violates the protocol locally.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The gateway answered the request with an error.
    #[error("gateway error {0}")]
    Gateway(GatewayError),

    /// No response within the deadline.
    #[error("request '{method}' timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Method that timed out.
        method: String,
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// The socket closed while the call was outstanding.
    #[error("gateway connection lost: {reason}")]
    ConnectionLost {
        /// Close reason reported by the transport.
        reason: String,
    },

    /// The client was closed locally.
    #[error("gateway connection closed")]
    ConnectionClosed,

    /// The client is not connected.
    #[error("Gateway not connected")]
    NotConnected,

    /// A payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The event sink failed or panicked while handling an event.
    #[error("event handler failed for '{event}': {message}")]
    EventHandler {
        /// Event name.
        event: String,
        /// Failure text.
        message: String,
    },
}

impl GatewayClientError {
    /// Stable machine-readable code.
    ///
    /// Application errors carry the gateway's own code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Handshake(_) => "HANDSHAKE_FAILED",
            Self::AuthRejected(_) => "AUTH_REJECTED",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Gateway(err) => &err.code,
            Self::Timeout { .. } => "TIMEOUT",
            Self::ConnectionLost { .. } => "CONNECTION_LOST",
            Self::ConnectionClosed => "CONNECTION_CLOSED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::EventHandler { .. } => "EVENT_HANDLER_ERROR",
        }
    }

    /// Whether callers should treat this as "gateway unavailable" and
    /// degrade rather than fail hard.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Handshake(_)
                | Self::Timeout { .. }
                | Self::ConnectionLost { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
        )
    }
}

impl From<ProtoError> for GatewayClientError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::Encoding(msg) | ProtoError::Decoding(msg) => Self::Serialization(msg),
            other => Self::Protocol(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GatewayClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
