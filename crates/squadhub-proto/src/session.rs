//! Session listing and gateway health payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parameters of `sessions.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsListParams {
    /// Maximum number of sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Only sessions active within this many minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_minutes: Option<u32>,
}

/// One agent session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session key, e.g. `agent:main:main`.
    pub key: String,
    /// Session kind, e.g. `direct` or `group`.
    #[serde(default)]
    pub kind: Option<String>,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Channel the session lives on.
    #[serde(default)]
    pub channel: Option<String>,
    /// Last activity, epoch millis.
    #[serde(default)]
    pub updated_at: Option<u64>,
    /// Model in use.
    #[serde(default)]
    pub model: Option<String>,
    /// Tokens consumed so far.
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

/// Result of `sessions.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionsListResult {
    /// Sessions, most recent first.
    #[serde(default)]
    pub sessions: Vec<Session>,
    /// Total count, when the gateway reports it.
    #[serde(default)]
    pub count: Option<u64>,
}

/// Status of one messaging channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    /// Channel has credentials.
    #[serde(default)]
    pub configured: Option<bool>,
    /// Channel worker is running.
    #[serde(default)]
    pub running: Option<bool>,
    /// Channel is connected upstream.
    #[serde(default)]
    pub connected: Option<bool>,
    /// Last error seen by the channel.
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Result of `health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayHealthResult {
    /// Overall health.
    #[serde(default)]
    pub ok: bool,
    /// Probe time, epoch millis.
    #[serde(default)]
    pub ts: Option<u64>,
    /// Probe duration.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Per-channel status.
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelStatus>,
}
