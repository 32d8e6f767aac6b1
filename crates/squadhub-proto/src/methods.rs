//! Method names understood by the squadhub gateway.

/// Handshake. Must be the first request on a connection.
pub const CONNECT: &str = "connect";
/// Gateway and channel health.
pub const HEALTH: &str = "health";
/// Gateway status summary.
pub const STATUS: &str = "status";
/// Send a chat message to a session.
pub const CHAT_SEND: &str = "chat.send";
/// Read a session's chat history.
pub const CHAT_HISTORY: &str = "chat.history";
/// Abort a running chat turn.
pub const CHAT_ABORT: &str = "chat.abort";
/// List sessions.
pub const SESSIONS_LIST: &str = "sessions.list";
/// List cron jobs.
pub const CRON_LIST: &str = "cron.list";
/// Add a cron job.
pub const CRON_ADD: &str = "cron.add";
