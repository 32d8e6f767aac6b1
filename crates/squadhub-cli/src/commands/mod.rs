//! CLI command implementations.
//!
//! Each submodule implements one command group:
//! - [`health`] - Gateway health and status
//! - [`chat`] - Sending messages, history, aborts
//! - [`sessions`] - Session listing
//! - [`cron`] - Cron job listing
//! - [`call`] - Raw method calls
//! - [`watch`] - Event streaming

pub mod call;
pub mod chat;
pub mod cron;
pub mod health;
pub mod sessions;
pub mod watch;

pub use call::CallCommand;
pub use chat::ChatCommand;
pub use cron::CronCommand;
pub use health::HealthCommand;
pub use sessions::SessionsCommand;
pub use watch::WatchCommand;
