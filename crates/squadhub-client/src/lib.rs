//! # squadhub-client
//!
//! WebSocket client for the squadhub gateway.
//!
//! - [`GatewayClient`]: one connection, `connect` handshake, multiplexed
//!   request/response correlation by id, event dispatch to a sink.
//! - [`SharedClientManager`]: one lazily connected client shared by every
//!   caller, with at most one connect attempt in flight, re-established on
//!   demand after the connection drops.
//! - [`GatewayContext`]: explicit process-level owner of the managers, one per
//!   gateway connection.
//!
//! ```no_run
//! use squadhub_client::{GatewayClientOptions, GatewayContext, SquadhubConnection};
//!
//! # async fn run() -> Result<(), squadhub_client::GatewayClientError> {
//! let ctx = GatewayContext::init(GatewayClientOptions::default());
//! let client = ctx.shared_client(&SquadhubConnection::from_env()).await?;
//! let health = client.health().await?;
//! println!("gateway ok: {}", health.ok);
//! ctx.shutdown();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
mod pending;
pub mod shared;
pub mod state;

pub use client::GatewayClient;
pub use config::{ClientIdentity, GatewayClientOptions, GatewayConfig, SquadhubConnection};
pub use context::GatewayContext;
pub use error::GatewayClientError;
pub use hooks::ClientHooks;
pub use shared::{ManagerState, SharedClientManager};
pub use state::ConnectionState;

/// Re-export of the wire types.
pub use squadhub_proto as proto;
