//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use squadhub_client::proto::{
    ChatEventState, ChatHistoryResponse, ChatSendResult, ChatUsage, CronListResult, CronSchedule,
    GatewayHealthResult, SessionsListResult,
};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write one value per line; JSON mode emits compact JSON lines.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_line<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        if self.is_json() {
            serde_json::to_writer(&mut *writer, value)
                .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
            writeln!(writer)?;
            writer.flush()?;
            Ok(())
        } else {
            value.write_table(writer)?;
            writer.flush()?;
            Ok(())
        }
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Untyped gateway result, printed as pretty JSON in either format.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RawResult(pub Value);

impl TableDisplay for RawResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        serde_json::to_writer_pretty(&mut *writer, &self.0)
            .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
        writeln!(writer)?;
        Ok(())
    }
}

/// One line of `watch` output.
#[derive(Debug, Clone, Serialize)]
pub struct EventLine {
    /// Event name.
    pub event: String,
    /// Gateway sequence number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    /// Event body.
    pub data: Value,
}

impl TableDisplay for EventLine {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let seq = self.seq.map_or_else(|| "-".to_string(), |s| s.to_string());
        writeln!(
            writer,
            "{:<20}  {:>6}  {}",
            truncate(&self.event, 20),
            seq,
            truncate(&self.data.to_string(), 100)
        )?;
        Ok(())
    }
}

/// Outcome of `chat send`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Run id.
    pub run_id: String,
    /// Terminal state, or `None` when the command did not wait.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ChatEventState>,
    /// Reply text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Token usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
    /// Model stop reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl TableDisplay for ChatReply {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match &self.text {
            Some(text) => writeln!(writer, "{text}")?,
            None => writeln!(writer, "Run {} accepted", self.run_id)?,
        }
        if let Some(usage) = &self.usage {
            writeln!(writer)?;
            writeln!(
                writer,
                "Tokens: {} in / {} out / {} total",
                usage.input,
                usage.output,
                usage.total()
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for ChatSendResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Run:     {}",
            self.run_id.as_deref().unwrap_or("-")
        )?;
        writeln!(writer, "Status:  {}", self.status.as_deref().unwrap_or("-"))?;
        Ok(())
    }
}

impl TableDisplay for GatewayHealthResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Gateway Health")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(
            writer,
            "Status:           {}",
            if self.ok { "ok" } else { "degraded" }
        )?;
        if let Some(duration) = self.duration_ms {
            writeln!(writer, "Probe Duration:   {duration} ms")?;
        }
        if self.channels.is_empty() {
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "{:<16}  {:<10}  {:<8}  {:<9}  {}",
            "CHANNEL", "CONFIGURED", "RUNNING", "CONNECTED", "LAST ERROR"
        )?;
        writeln!(writer, "{}", "─".repeat(72))?;
        for (name, channel) in &self.channels {
            writeln!(
                writer,
                "{:<16}  {:<10}  {:<8}  {:<9}  {}",
                truncate(name, 16),
                yes_no(channel.configured),
                yes_no(channel.running),
                yes_no(channel.connected),
                channel.last_error.as_deref().map_or("", |e| e)
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for SessionsListResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.sessions.is_empty() {
            writeln!(writer, "No sessions")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<32}  {:<10}  {:<12}  {:<20}  {:>8}",
            "KEY", "KIND", "CHANNEL", "MODEL", "TOKENS"
        )?;
        writeln!(writer, "{}", "─".repeat(90))?;
        for session in &self.sessions {
            writeln!(
                writer,
                "{:<32}  {:<10}  {:<12}  {:<20}  {:>8}",
                truncate(&session.key, 32),
                session.kind.as_deref().unwrap_or("-"),
                truncate(session.channel.as_deref().unwrap_or("-"), 12),
                truncate(session.model.as_deref().unwrap_or("-"), 20),
                session
                    .total_tokens
                    .map_or_else(|| "-".to_string(), |t| t.to_string())
            )?;
        }

        writeln!(writer)?;
        let total = self.count.unwrap_or(self.sessions.len() as u64);
        writeln!(writer, "Total: {total} session(s)")?;
        Ok(())
    }
}

impl TableDisplay for ChatHistoryResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.messages.is_empty() {
            writeln!(writer, "No messages in {}", self.session_key)?;
            return Ok(());
        }

        for message in &self.messages {
            let role = serde_json::to_value(message.role)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            writeln!(writer, "[{role}] {}", message.text())?;
        }
        Ok(())
    }
}

impl TableDisplay for CronListResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.jobs.is_empty() {
            writeln!(writer, "No cron jobs")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<36}  {:<20}  {:<7}  {:<24}  {}",
            "ID", "NAME", "ENABLED", "SCHEDULE", "LAST STATUS"
        )?;
        writeln!(writer, "{}", "─".repeat(100))?;
        for job in &self.jobs {
            let last = job
                .state
                .as_ref()
                .and_then(|s| s.last_status.as_deref())
                .unwrap_or("-");
            writeln!(
                writer,
                "{:<36}  {:<20}  {:<7}  {:<24}  {}",
                truncate(&job.id, 36),
                truncate(&job.name, 20),
                if job.enabled { "yes" } else { "no" },
                truncate(&describe_schedule(&job.schedule), 24),
                last
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} job(s)", self.jobs.len())?;
        Ok(())
    }
}

fn describe_schedule(schedule: &CronSchedule) -> String {
    match schedule {
        CronSchedule::At { at_ms } => format!("at {at_ms}"),
        CronSchedule::Every { every_ms, .. } => format!("every {}s", every_ms / 1000),
        CronSchedule::Cron { expr, tz } => match tz {
            Some(tz) => format!("{expr} ({tz})"),
            None => expr.clone(),
        },
    }
}

const fn yes_no(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use squadhub_client::proto::{ChannelStatus, Session};

    fn health() -> GatewayHealthResult {
        let mut result = GatewayHealthResult {
            ok: true,
            duration_ms: Some(12),
            ..GatewayHealthResult::default()
        };
        result.channels.insert(
            "telegram".into(),
            ChannelStatus {
                configured: Some(true),
                running: Some(true),
                connected: Some(false),
                last_error: Some("token expired".into()),
            },
        );
        result
    }

    #[test]
    fn health_table_lists_channels() {
        let output = OutputFormat::new(Format::Table).to_string(&health()).unwrap();

        assert!(output.contains("Gateway Health"));
        assert!(output.contains("Probe Duration:   12 ms"));
        assert!(output.contains("telegram"));
        assert!(output.contains("token expired"));
    }

    #[test]
    fn health_json_is_gateway_shape() {
        let output = OutputFormat::new(Format::Json).to_string(&health()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["ok"], json!(true));
        assert_eq!(value["channels"]["telegram"]["lastError"], json!("token expired"));
    }

    #[test]
    fn empty_sessions_table() {
        let output = OutputFormat::default()
            .to_string(&SessionsListResult::default())
            .unwrap();
        assert_eq!(output, "No sessions\n");
    }

    #[test]
    fn sessions_table_counts_rows() {
        let result = SessionsListResult {
            sessions: vec![Session {
                key: "agent:main:main".into(),
                kind: Some("direct".into()),
                display_name: None,
                channel: None,
                updated_at: None,
                model: Some("claude".into()),
                total_tokens: Some(1200),
            }],
            count: None,
        };

        let output = OutputFormat::default().to_string(&result).unwrap();

        assert!(output.contains("agent:main:main"));
        assert!(output.contains("1200"));
        assert!(output.contains("Total: 1 session(s)"));
    }

    #[test]
    fn raw_result_prints_json_in_table_mode() {
        let output = OutputFormat::default()
            .to_string(&RawResult(json!({"uptime": 5})))
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value, json!({"uptime": 5}));
    }

    #[test]
    fn chat_reply_without_text_reports_run() {
        let reply = ChatReply {
            run_id: "run-1".into(),
            state: None,
            text: None,
            usage: None,
            stop_reason: None,
        };
        let output = OutputFormat::default().to_string(&reply).unwrap();
        assert_eq!(output, "Run run-1 accepted\n");
    }

    #[test]
    fn event_line_json_is_compact() {
        let line = EventLine {
            event: "tick".into(),
            seq: Some(3),
            data: json!({"ts": 1}),
        };
        let mut buf = Vec::new();
        OutputFormat::new(Format::Json)
            .write_line(&mut buf, &line)
            .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"event\":\"tick\",\"seq\":3,\"data\":{\"ts\":1}}\n"
        );
    }

    #[test]
    fn describe_schedule_variants() {
        assert_eq!(
            describe_schedule(&CronSchedule::Every {
                every_ms: 60_000,
                anchor_ms: None
            }),
            "every 60s"
        );
        assert_eq!(
            describe_schedule(&CronSchedule::Cron {
                expr: "0 9 * * *".into(),
                tz: Some("UTC".into())
            }),
            "0 9 * * * (UTC)"
        );
    }

    #[test]
    fn truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn truncate_very_short_max() {
        assert_eq!(truncate("hello", 3), "hel");
    }
}
