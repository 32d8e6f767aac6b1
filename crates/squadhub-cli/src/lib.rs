//! # squadhub-cli
//!
//! Command-line client for a squadhub gateway.
//!
//! Provides commands for:
//! - Gateway health and status
//! - Chatting with agent sessions and reading their history
//! - Listing sessions and cron jobs
//! - Calling any gateway method with raw JSON params
//! - Watching the gateway event stream
//!
//! # Architecture
//!
//! Every command runs against the shared client kept by a
//! [`squadhub_client::GatewayContext`], so a command that needs several
//! requests reuses one authenticated connection, and `watch` reconnects
//! through the same manager when the gateway goes away.
//!
//! ```text
//! ┌──────────────┐   JSON frames    ┌──────────────────┐
//! │ squadhub-cli │◄────────────────►│ squadhub gateway │
//! └──────────────┘   (WebSocket)    └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
