//! Typed view over event frames.

use serde::Deserialize;

use crate::chat::ChatEvent;
use crate::error::ProtoError;
use crate::frame::EventFrame;

/// Streamed chat output.
pub const CHAT: &str = "chat";
/// Agent lifecycle and tool activity.
pub const AGENT: &str = "agent";
/// Periodic keepalive.
pub const TICK: &str = "tick";
/// Pre-handshake challenge.
pub const CONNECT_CHALLENGE: &str = "connect.challenge";

/// A decoded gateway event.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// Chat stream update.
    Chat(ChatEvent),
    /// Keepalive.
    Tick {
        /// Gateway time, epoch millis.
        ts: Option<u64>,
    },
    /// Anything else, passed through raw.
    Other(EventFrame),
}

#[derive(Deserialize)]
struct TickPayload {
    #[serde(default)]
    ts: Option<u64>,
}

impl GatewayEvent {
    /// Decode a frame into a typed event.
    ///
    /// Only known event names are checked; a known name with a payload that
    /// does not match its shape is a decoding error.
    pub fn decode(frame: &EventFrame) -> Result<Self, ProtoError> {
        match frame.event.as_str() {
            CHAT => serde_json::from_value(frame.data.clone())
                .map(Self::Chat)
                .map_err(|e| ProtoError::Decoding(format!("chat event: {e}"))),
            TICK => {
                let tick: TickPayload = serde_json::from_value(frame.data.clone())
                    .unwrap_or(TickPayload { ts: None });
                Ok(Self::Tick { ts: tick.ts })
            }
            _ => Ok(Self::Other(frame.clone())),
        }
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Chat(_) => CHAT,
            Self::Tick { .. } => TICK,
            Self::Other(frame) => &frame.event,
        }
    }
}
