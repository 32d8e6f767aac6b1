//! Cron job payloads for `cron.list` and `cron.add`.

use serde::{Deserialize, Serialize};

/// When a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CronSchedule {
    /// Once, at an absolute time.
    #[serde(rename_all = "camelCase")]
    At {
        /// Epoch millis.
        at_ms: u64,
    },
    /// Repeatedly, at a fixed interval.
    #[serde(rename_all = "camelCase")]
    Every {
        /// Interval.
        every_ms: u64,
        /// Phase anchor, epoch millis.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor_ms: Option<u64>,
    },
    /// By cron expression.
    Cron {
        /// Cron expression.
        expr: String,
        /// IANA time zone.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tz: Option<String>,
    },
}

/// Which session a job runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronSessionTarget {
    /// The agent's main session.
    #[default]
    Main,
    /// A fresh isolated session.
    Isolated,
}

/// When the agent is woken for a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CronWakeMode {
    /// On the next heartbeat.
    #[default]
    NextHeartbeat,
    /// Immediately.
    Now,
}

/// What a job does when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CronPayload {
    /// Inject a system event into the session.
    SystemEvent {
        /// Event text.
        text: String,
    },
    /// Run an agent turn.
    #[serde(rename_all = "camelCase")]
    AgentTurn {
        /// Prompt.
        message: String,
        /// Model override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        /// Thinking level.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thinking: Option<String>,
        /// Turn timeout.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u64>,
        /// Deliver the reply to a channel.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deliver: Option<bool>,
        /// Delivery channel.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
        /// Delivery recipient.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
}

/// Runtime state of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobState {
    /// Next fire time.
    #[serde(default)]
    pub next_run_at_ms: Option<u64>,
    /// Last fire time.
    #[serde(default)]
    pub last_run_at_ms: Option<u64>,
    /// Last outcome, e.g. `ok` or `error`.
    #[serde(default)]
    pub last_status: Option<String>,
    /// Last error.
    #[serde(default)]
    pub last_error: Option<String>,
    /// Last run duration.
    #[serde(default)]
    pub last_duration_ms: Option<u64>,
}

/// A scheduled job as stored by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJob {
    /// Job id.
    pub id: String,
    /// Owning agent.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the job is active.
    #[serde(default)]
    pub enabled: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at_ms: Option<u64>,
    /// Last update time.
    #[serde(default)]
    pub updated_at_ms: Option<u64>,
    /// Schedule.
    pub schedule: CronSchedule,
    /// Session target.
    #[serde(default)]
    pub session_target: CronSessionTarget,
    /// Wake mode.
    #[serde(default)]
    pub wake_mode: CronWakeMode,
    /// Action.
    pub payload: CronPayload,
    /// Runtime state.
    #[serde(default)]
    pub state: Option<CronJobState>,
}

/// A job to create via `cron.add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronAddJob {
    /// Owning agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the job starts enabled.
    pub enabled: bool,
    /// Schedule.
    pub schedule: CronSchedule,
    /// Session target.
    pub session_target: CronSessionTarget,
    /// Wake mode.
    pub wake_mode: CronWakeMode,
    /// Action.
    pub payload: CronPayload,
}

/// Result of `cron.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronListResult {
    /// Jobs.
    #[serde(default)]
    pub jobs: Vec<CronJob>,
}
