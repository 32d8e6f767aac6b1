//! Chat payloads: `chat.send`, `chat.history`, `chat.abort` params and the
//! streamed `chat` event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters of `chat.send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendParams {
    /// Target session.
    pub session_key: String,
    /// User message text.
    pub message: String,
    /// Thinking level override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Whether the reply should also be delivered to the session's channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliver: Option<bool>,
    /// Inline attachments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<ChatAttachment>,
    /// Server-side run timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Deduplication key; also used as the run id by the gateway.
    pub idempotency_key: String,
}

impl ChatSendParams {
    /// Message to a session, with the idempotency key left for the caller.
    #[must_use]
    pub fn new(session_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            message: message.into(),
            thinking: None,
            deliver: None,
            attachments: Vec::new(),
            timeout_ms: None,
            idempotency_key: String::new(),
        }
    }

    /// Set the idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = key.into();
        self
    }

    /// Add an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: ChatAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Attachment sent with a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAttachment {
    /// Attachment kind, e.g. `image`.
    #[serde(rename = "type")]
    pub kind: String,
    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Base64 content.
    pub content: String,
}

/// Acknowledgement of `chat.send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendResult {
    /// Run started for this message.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Run status, e.g. `started`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Parameters of `chat.history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryParams {
    /// Session to read.
    pub session_key: String,
    /// Maximum number of messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters of `chat.abort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAbortParams {
    /// Session whose run to abort.
    pub session_key: String,
    /// Specific run; the active run when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

/// Result of `chat.history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryResponse {
    /// Session read.
    pub session_key: String,
    /// Backing session id.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Messages, oldest first.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Session thinking level.
    #[serde(default)]
    pub thinking_level: Option<String>,
}

/// Lifecycle state carried by a `chat` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatEventState {
    /// Partial output.
    Delta,
    /// Run finished.
    Final,
    /// Run aborted.
    Aborted,
    /// Run failed.
    Error,
}

impl ChatEventState {
    /// Whether no further events follow for the run.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Delta)
    }
}

/// A streamed chat update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    /// Run this event belongs to.
    pub run_id: String,
    /// Session the run belongs to.
    pub session_key: String,
    /// Per-run sequence number.
    #[serde(default)]
    pub seq: u64,
    /// Lifecycle state.
    pub state: ChatEventState,
    /// Message so far (delta) or the complete message (final).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    /// Error text for `error` state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Token usage, on terminal events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
    /// Model stop reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Token usage summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUsage {
    /// Input tokens.
    #[serde(default)]
    pub input: u64,
    /// Output tokens.
    #[serde(default)]
    pub output: u64,
    /// Prompt cache reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read: Option<u64>,
    /// Prompt cache writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write: Option<u64>,
    /// Total tokens, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl ChatUsage {
    /// Reported total, or input plus output.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total_tokens
            .unwrap_or_else(|| self.input.saturating_add(self.output))
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageRole {
    /// User.
    User,
    /// Assistant.
    Assistant,
    /// System.
    System,
    /// Tool output.
    #[serde(alias = "tool")]
    ToolResult,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author.
    pub role: MessageRole,
    /// Content blocks.
    #[serde(default)]
    pub content: Vec<MessageContent>,
    /// Epoch millis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl ChatMessage {
    /// Concatenated text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                MessageContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A typed content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text.
    Text {
        /// Text.
        text: String,
    },
    /// Image, inline or by URL.
    Image {
        /// Inline source (base64 and media type).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<Value>,
        /// Remote URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// A tool invocation by the assistant.
    #[serde(alias = "toolCall")]
    ToolUse {
        /// Invocation id.
        id: String,
        /// Tool name.
        name: String,
        /// Tool input.
        #[serde(default)]
        input: Value,
    },
    /// Output of a tool invocation.
    #[serde(rename_all = "camelCase")]
    ToolResult {
        /// Invocation id this answers.
        tool_use_id: String,
        /// Tool output.
        #[serde(default)]
        content: Value,
        /// Whether the tool failed.
        #[serde(default)]
        is_error: bool,
    },
    /// Model reasoning.
    Thinking {
        /// Reasoning text.
        thinking: String,
    },
    /// Block type this client does not know.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_params_serialize_camel_case() {
        let params = ChatSendParams::new("agent:main:main", "hi").with_idempotency_key("run-1");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["sessionKey"], "agent:main:main");
        assert_eq!(value["idempotencyKey"], "run-1");
        assert!(value.get("attachments").is_none());
        assert!(value.get("thinking").is_none());
    }

    #[test]
    fn chat_event_decodes_blocks_and_usage() {
        let event: ChatEvent = serde_json::from_value(json!({
            "runId": "r1",
            "sessionKey": "s",
            "seq": 4,
            "state": "final",
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "thinking", "thinking": "hmm"},
                    {"type": "text", "text": "Hello"},
                    {"type": "tool_use", "id": "t1", "name": "search", "input": {"q": "x"}},
                    {"type": "tool_result", "toolUseId": "t1", "content": "ok", "isError": false},
                    {"type": "text", "text": "!"}
                ],
                "timestamp": 1_234_567_890
            },
            "usage": {"input": 10, "output": 5},
            "stopReason": "end_turn"
        }))
        .unwrap();

        assert_eq!(event.state, ChatEventState::Final);
        assert!(event.state.is_terminal());
        let message = event.message.unwrap();
        assert_eq!(message.content.len(), 5);
        assert_eq!(message.text(), "Hello!");
        assert_eq!(event.usage.unwrap().total(), 15);
    }

    #[test]
    fn unknown_block_type_is_preserved_as_unknown() {
        let message: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": [{"type": "audio", "data": "..."}]
        }))
        .unwrap();
        assert_eq!(message.content, vec![MessageContent::Unknown]);
    }

    #[test]
    fn delta_is_not_terminal() {
        assert!(!ChatEventState::Delta.is_terminal());
        assert!(ChatEventState::Aborted.is_terminal());
        assert!(ChatEventState::Error.is_terminal());
    }

    #[test]
    fn tool_role_alias_is_accepted() {
        let role: MessageRole = serde_json::from_value(json!("tool")).unwrap();
        assert_eq!(role, MessageRole::ToolResult);
    }

    #[test]
    fn usage_prefers_reported_total() {
        let usage = ChatUsage {
            input: 1,
            output: 2,
            total_tokens: Some(10),
            ..ChatUsage::default()
        };
        assert_eq!(usage.total(), 10);
    }
}
