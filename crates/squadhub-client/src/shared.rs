//! Lazily connected, self-healing shared client.
//!
//! A [`SharedClientManager`] hands every caller the same connected
//! [`GatewayClient`]. When none is cached it starts exactly one connect
//! attempt, which all concurrent callers await together. When the cached
//! client's connection closes, its close hook clears the cache, so the next
//! caller triggers a fresh connection.

use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::client::GatewayClient;
use crate::config::{GatewayClientOptions, SquadhubConnection};
use crate::error::GatewayClientError;

type SharedAttempt = Shared<BoxFuture<'static, Result<GatewayClient, GatewayClientError>>>;

/// Rounds `get` tries when a fresh client drops before it can be returned.
const MAX_ACQUIRE_ROUNDS: usize = 3;

/// Observable state of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// No connected client and no attempt running.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// A connected client is cached.
    Ready,
}

#[derive(Default)]
struct Slot {
    client: Option<GatewayClient>,
    connecting: Option<(u64, SharedAttempt)>,
    /// Bumped by every new attempt and by shutdown. Hooks and attempts only
    /// touch the slot while it still carries their generation.
    generation: u64,
    shut_down: bool,
}

/// Owns the shared client for one gateway connection.
pub struct SharedClientManager {
    connection: SquadhubConnection,
    options: GatewayClientOptions,
    slot: Arc<Mutex<Slot>>,
}

impl std::fmt::Debug for SharedClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedClientManager")
            .field("connection", &self.connection)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SharedClientManager {
    /// Manager for `connection`; clients are built with `options`.
    #[must_use]
    pub fn new(connection: SquadhubConnection, options: GatewayClientOptions) -> Self {
        Self {
            connection,
            options,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Connection this manager serves.
    #[must_use]
    pub fn connection(&self) -> &SquadhubConnection {
        &self.connection
    }

    /// The shared connected client, connecting first when needed.
    ///
    /// # Errors
    ///
    /// Returns the connect error of the attempt this call joined or started,
    /// or [`GatewayClientError::ConnectionClosed`] after [`shutdown`](Self::shutdown).
    pub async fn get(&self) -> Result<GatewayClient, GatewayClientError> {
        for _ in 0..MAX_ACQUIRE_ROUNDS {
            let attempt = {
                let mut slot = self.slot.lock();
                if slot.shut_down {
                    return Err(GatewayClientError::ConnectionClosed);
                }
                if let Some(client) = slot.client.as_ref().filter(|c| c.is_connected()) {
                    return Ok(client.clone());
                }
                if let Some((_, attempt)) = slot.connecting.as_ref() {
                    attempt.clone()
                } else {
                    slot.generation += 1;
                    let generation = slot.generation;
                    let stale = slot.client.take();
                    let attempt = self.establish(generation, stale).shared();
                    slot.connecting = Some((generation, attempt.clone()));
                    attempt
                }
            };

            let client = attempt.await?;
            if client.is_connected() {
                return Ok(client);
            }
            debug!(url = %self.connection.url, "shared client closed before use, reacquiring");
        }

        Err(GatewayClientError::ConnectionLost {
            reason: "connection dropped right after connecting".to_string(),
        })
    }

    /// The cached client if it is connected. Never connects.
    #[must_use]
    pub fn current(&self) -> Option<GatewayClient> {
        self.slot
            .lock()
            .client
            .as_ref()
            .filter(|c| c.is_connected())
            .cloned()
    }

    /// Current manager state.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        let slot = self.slot.lock();
        if slot.client.as_ref().is_some_and(GatewayClient::is_connected) {
            ManagerState::Ready
        } else if slot.connecting.is_some() {
            ManagerState::Connecting
        } else {
            ManagerState::Idle
        }
    }

    /// Close the cached client and refuse further `get` calls.
    ///
    /// An attempt still in flight closes its client when it completes.
    pub fn shutdown(&self) {
        let client = {
            let mut slot = self.slot.lock();
            slot.shut_down = true;
            slot.generation += 1;
            slot.connecting = None;
            slot.client.take()
        };
        if let Some(client) = client {
            client.close();
        }
        debug!(url = %self.connection.url, "shared client manager shut down");
    }

    fn establish(
        &self,
        generation: u64,
        stale: Option<GatewayClient>,
    ) -> BoxFuture<'static, Result<GatewayClient, GatewayClientError>> {
        let weak = Arc::downgrade(&self.slot);
        let hooks = self.options.hooks.clone().before_close(move |code, reason| {
            let Some(slot) = weak.upgrade() else {
                return;
            };
            let mut slot = slot.lock();
            if slot.generation != generation {
                return;
            }
            slot.client = None;
            if slot.connecting.as_ref().is_some_and(|(n, _)| *n == generation) {
                slot.connecting = None;
            }
            debug!(code, reason, "shared client closed, cache cleared");
        });

        let slot = Arc::clone(&self.slot);
        let connection = self.connection.clone();
        let options = self.options.clone().with_hooks(hooks);

        async move {
            if let Some(stale) = stale {
                stale.close();
            }

            let client = GatewayClient::new(connection, options);
            let outcome = client.connect().await.map(|()| client);

            let superseded = {
                let mut slot = slot.lock();
                if slot.generation == generation {
                    slot.connecting = None;
                    slot.client = outcome.as_ref().ok().cloned();
                    false
                } else {
                    true
                }
            };

            match outcome {
                Ok(client) if superseded => {
                    client.close();
                    Err(GatewayClientError::ConnectionClosed)
                }
                Ok(client) => {
                    info!(url = %client.url(), client = client.id(), "shared gateway client ready");
                    Ok(client)
                }
                Err(e) => Err(e),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn refused_connection() -> SquadhubConnection {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        SquadhubConnection::new(format!("http://{addr}"), "")
    }

    fn options() -> GatewayClientOptions {
        GatewayClientOptions::default().with_connect_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn starts_idle() {
        let manager = SharedClientManager::new(refused_connection().await, options());
        assert_eq!(manager.state(), ManagerState::Idle);
        assert!(manager.current().is_none());
    }

    #[tokio::test]
    async fn failed_attempt_does_not_wedge_later_callers() {
        let manager = SharedClientManager::new(refused_connection().await, options());

        let first = manager.get().await.unwrap_err();
        assert!(matches!(first, GatewayClientError::Transport(_)));
        assert_eq!(manager.state(), ManagerState::Idle);

        let second = manager.get().await.unwrap_err();
        assert!(matches!(second, GatewayClientError::Transport(_)));
    }

    #[tokio::test]
    async fn concurrent_failures_share_one_outcome() {
        let manager = SharedClientManager::new(refused_connection().await, options());

        let (a, b) = tokio::join!(manager.get(), manager.get());

        assert_eq!(a.unwrap_err().to_string(), b.unwrap_err().to_string());
    }

    #[tokio::test]
    async fn shutdown_refuses_further_gets() {
        let manager = SharedClientManager::new(refused_connection().await, options());
        manager.shutdown();
        assert!(matches!(
            manager.get().await,
            Err(GatewayClientError::ConnectionClosed)
        ));
    }
}
