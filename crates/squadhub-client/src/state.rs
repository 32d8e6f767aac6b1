//! Connection state types.

use std::sync::atomic::{AtomicU32, Ordering};

/// State of one gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket. Initial state, and the state after a failed handshake.
    Disconnected,
    /// Socket opening or handshake in progress.
    Connecting,
    /// Handshake complete; requests may be sent.
    Connected,
    /// Local close in progress.
    Closing,
    /// Terminal.
    Closed,
}

impl ConnectionState {
    const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }

    /// Lower-case name, for logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic wrapper for connection state.
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU32);

impl AtomicConnectionState {
    /// Create a new atomic state.
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self(AtomicU32::new(state as u32))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        ConnectionState::from_u32(self.0.load(Ordering::SeqCst))
    }

    /// Store a new state.
    pub fn store(&self, state: ConnectionState) {
        self.0.store(state as u32, Ordering::SeqCst);
    }

    /// Store a new state, returning the previous one.
    pub fn swap(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u32(self.0.swap(state as u32, Ordering::SeqCst))
    }

    /// Move from `current` to `new` only if the state is still `current`.
    ///
    /// Returns the state observed when the transition did not happen.
    pub fn transition(
        &self,
        current: ConnectionState,
        new: ConnectionState,
    ) -> Result<(), ConnectionState> {
        self.0
            .compare_exchange(current as u32, new as u32, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(ConnectionState::from_u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_enum() {
        assert_eq!(ConnectionState::Disconnected as u32, 0);
        assert_eq!(ConnectionState::Connecting as u32, 1);
        assert_eq!(ConnectionState::Connected as u32, 2);
        assert_eq!(ConnectionState::Closing as u32, 3);
        assert_eq!(ConnectionState::Closed as u32, 4);
    }

    #[test]
    fn test_atomic_connection_state() {
        let state = AtomicConnectionState::new(ConnectionState::Disconnected);
        assert_eq!(state.load(), ConnectionState::Disconnected);

        state.store(ConnectionState::Connecting);
        assert_eq!(state.load(), ConnectionState::Connecting);

        assert_eq!(state.swap(ConnectionState::Connected), ConnectionState::Connecting);
        assert_eq!(state.load(), ConnectionState::Connected);
    }

    #[test]
    fn test_transition_only_from_expected_state() {
        let state = AtomicConnectionState::new(ConnectionState::Connecting);
        assert_eq!(
            state.transition(ConnectionState::Connecting, ConnectionState::Connected),
            Ok(())
        );
        assert_eq!(
            state.transition(ConnectionState::Connecting, ConnectionState::Disconnected),
            Err(ConnectionState::Connected)
        );
        assert_eq!(state.load(), ConnectionState::Connected);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ConnectionState::Closing.to_string(), "closing");
        assert_eq!(ConnectionState::Connected.as_str(), "connected");
    }
}
