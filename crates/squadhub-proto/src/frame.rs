//! Wire frames exchanged with the squadhub gateway.
//!
//! Every frame is a JSON object discriminated by its `type` field:
//! `req` (client to gateway), `res` (gateway answer to a `req`), and
//! `event` (unsolicited gateway push).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ProtoError;

/// Any frame on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// Request frame.
    #[serde(rename = "req", alias = "request")]
    Request(RequestFrame),
    /// Response frame.
    #[serde(rename = "res", alias = "response")]
    Response(ResponseFrame),
    /// Event frame.
    #[serde(rename = "event")]
    Event(EventFrame),
}

impl Frame {
    /// Parse a text payload, yielding `None` for anything that is not one of
    /// the three frame kinds.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Deserialize from JSON.
    pub fn from_json(text: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(text).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Short name of the frame kind, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "req",
            Self::Response(_) => "res",
            Self::Event(_) => "event",
        }
    }
}

impl From<RequestFrame> for Frame {
    fn from(frame: RequestFrame) -> Self {
        Self::Request(frame)
    }
}

impl From<ResponseFrame> for Frame {
    fn from(frame: ResponseFrame) -> Self {
        Self::Response(frame)
    }
}

impl From<EventFrame> for Frame {
    fn from(frame: EventFrame) -> Self {
        Self::Event(frame)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// A call issued by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    /// Caller-generated id, unique on the connection while the call is live.
    pub id: String,
    /// Method name, e.g. `chat.send`.
    pub method: String,
    /// Method parameters.
    #[serde(default = "empty_object")]
    pub params: Value,
}

impl RequestFrame {
    /// Create a request frame. `Null` params are sent as an empty object.
    #[must_use]
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        let params = if params.is_null() { empty_object() } else { params };
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Serialize as a complete `req` frame.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        Frame::Request(self.clone()).to_json()
    }
}

/// The gateway's answer to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Id of the request being answered.
    pub id: String,
    /// Whether the call succeeded.
    pub ok: bool,
    /// Result on success. The gateway spells this `payload`.
    #[serde(default, alias = "payload", skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<GatewayError>,
}

impl ResponseFrame {
    /// Successful response.
    #[must_use]
    pub fn ok(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// Failed response.
    #[must_use]
    pub fn err(id: impl Into<String>, error: GatewayError) -> Self {
        Self {
            id: id.into(),
            ok: false,
            result: None,
            error: Some(error),
        }
    }

    /// Collapse into the call outcome.
    ///
    /// A failed response without an error body yields an `UNKNOWN` error.
    pub fn into_result(self) -> Result<Value, GatewayError> {
        if self.ok {
            Ok(self.result.unwrap_or(Value::Null))
        } else {
            Err(self
                .error
                .unwrap_or_else(|| GatewayError::new("UNKNOWN", "request failed")))
        }
    }
}

/// An unsolicited push from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    /// Event name, e.g. `chat`.
    pub event: String,
    /// Event body. The gateway spells this `payload`.
    #[serde(default, alias = "payload")]
    pub data: Value,
    /// Gateway-assigned sequence number, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl EventFrame {
    /// Create an event frame.
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            seq: None,
        }
    }

    /// Attach a sequence number.
    #[must_use]
    pub const fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }
}

/// Application-level error returned by the gateway for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct GatewayError {
    /// Machine-readable code, e.g. `INVALID_REQUEST`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Extra structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Whether retrying the same call may succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    /// Suggested retry delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl GatewayError {
    /// Create an error with a code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: None,
            retry_after_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn request_serializes_with_req_tag() {
        let frame = RequestFrame::new("1", "chat.send", json!({"text": "hi"}));
        let value: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "req");
        assert_eq!(value["id"], "1");
        assert_eq!(value["method"], "chat.send");
        assert_eq!(value["params"]["text"], "hi");
    }

    #[test]
    fn null_params_become_empty_object() {
        let frame = RequestFrame::new("1", "health", Value::Null);
        assert_eq!(frame.params, json!({}));
    }

    #[test]
    fn response_accepts_payload_alias() {
        let frame = Frame::parse(r#"{"type":"res","id":"7","ok":true,"payload":{"ack":true}}"#);
        match frame {
            Some(Frame::Response(res)) => {
                assert_eq!(res.id, "7");
                assert_eq!(res.into_result().unwrap(), json!({"ack": true}));
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn response_error_surfaces_gateway_error() {
        let text = r#"{"type":"res","id":"9","ok":false,"error":{"code":"INVALID_REQUEST","message":"bad"}}"#;
        let Some(Frame::Response(res)) = Frame::parse(text) else {
            panic!("expected response");
        };
        let err = res.into_result().unwrap_err();
        assert_eq!(err.code, "INVALID_REQUEST");
        assert_eq!(err.to_string(), "INVALID_REQUEST: bad");
    }

    #[test]
    fn failed_response_without_body_is_unknown() {
        let res = ResponseFrame {
            id: "1".into(),
            ok: false,
            result: None,
            error: None,
        };
        assert_eq!(res.into_result().unwrap_err().code, "UNKNOWN");
    }

    #[test]
    fn event_accepts_payload_alias_and_seq() {
        let text = r#"{"type":"event","event":"tick","payload":{"ts":5},"seq":3}"#;
        let Some(Frame::Event(event)) = Frame::parse(text) else {
            panic!("expected event");
        };
        assert_eq!(event.event, "tick");
        assert_eq!(event.data, json!({"ts": 5}));
        assert_eq!(event.seq, Some(3));
    }

    #[test_case(r#"{"type":"request","id":"1","method":"m"}"#, "req" ; "long request tag")]
    #[test_case(r#"{"type":"response","id":"1","ok":true}"#, "res" ; "long response tag")]
    #[test_case(r#"{"type":"event","event":"agent"}"#, "event" ; "event without data")]
    fn parse_accepts_frame_kinds(text: &str, kind: &str) {
        assert_eq!(Frame::parse(text).map(|f| f.kind()), Some(kind));
    }

    #[test_case("not json" ; "garbage")]
    #[test_case(r#"{"id":"1","ok":true}"# ; "missing type")]
    #[test_case(r#"{"type":"hello","id":"1"}"# ; "unknown type")]
    #[test_case(r#"{"type":"res","ok":true}"# ; "response without id")]
    #[test_case(r#"[1,2,3]"# ; "array")]
    fn parse_rejects_non_frames(text: &str) {
        assert!(Frame::parse(text).is_none());
    }

    #[test]
    fn from_json_reports_decoding_error() {
        let err = Frame::from_json("{").unwrap_err();
        assert!(matches!(err, ProtoError::Decoding(_)));
    }
}
