//! Process-level registry of shared clients.
//!
//! Built once by the entry point with [`GatewayContext::init`], handed to
//! whatever needs the gateway, and torn down with
//! [`GatewayContext::shutdown`]. Each distinct [`SquadhubConnection`] gets its
//! own [`SharedClientManager`], so several gateways (one per tenant) can be
//! served from one process.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::client::GatewayClient;
use crate::config::{GatewayClientOptions, SquadhubConnection};
use crate::error::GatewayClientError;
use crate::shared::SharedClientManager;

/// Owner of every shared gateway client in the process.
#[derive(Debug)]
pub struct GatewayContext {
    options: GatewayClientOptions,
    registry: Mutex<Registry>,
}

#[derive(Debug, Default)]
struct Registry {
    managers: HashMap<SquadhubConnection, Arc<SharedClientManager>>,
    shut_down: bool,
}

impl GatewayContext {
    /// Create a context whose clients are built with `options`.
    #[must_use]
    pub fn init(options: GatewayClientOptions) -> Arc<Self> {
        Arc::new(Self {
            options,
            registry: Mutex::new(Registry::default()),
        })
    }

    /// Manager for `connection`, created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayClientError::ConnectionClosed`] after shutdown.
    pub fn manager(
        &self,
        connection: &SquadhubConnection,
    ) -> Result<Arc<SharedClientManager>, GatewayClientError> {
        let mut registry = self.registry.lock();
        if registry.shut_down {
            return Err(GatewayClientError::ConnectionClosed);
        }
        let manager = registry
            .managers
            .entry(connection.clone())
            .or_insert_with(|| {
                Arc::new(SharedClientManager::new(
                    connection.clone(),
                    self.options.clone(),
                ))
            });
        Ok(Arc::clone(manager))
    }

    /// The shared connected client for `connection`.
    ///
    /// # Errors
    ///
    /// Returns the connect error, or [`GatewayClientError::ConnectionClosed`]
    /// after shutdown.
    pub async fn shared_client(
        &self,
        connection: &SquadhubConnection,
    ) -> Result<GatewayClient, GatewayClientError> {
        self.manager(connection)?.get().await
    }

    /// Connections with a registered manager.
    #[must_use]
    pub fn connections(&self) -> Vec<SquadhubConnection> {
        self.registry.lock().managers.keys().cloned().collect()
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.registry.lock().shut_down
    }

    /// Close every shared client. Later calls fail with "connection closed".
    pub fn shutdown(&self) {
        let managers: Vec<_> = {
            let mut registry = self.registry.lock();
            registry.shut_down = true;
            registry.managers.drain().map(|(_, m)| m).collect()
        };
        let count = managers.len();
        for manager in managers {
            manager.shutdown();
        }
        info!(managers = count, "gateway context shut down");
    }
}
