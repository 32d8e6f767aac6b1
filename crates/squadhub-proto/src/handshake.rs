//! Connect handshake payloads.
//!
//! The first frame on every connection is a `connect` request carrying
//! [`ConnectParams`]; the gateway answers with a [`HelloOk`] payload before
//! it accepts any other request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;

/// Protocol version spoken by this client.
pub const PROTOCOL_VERSION: u32 = 3;

/// `type` value of a successful hello payload.
pub const HELLO_OK: &str = "hello-ok";

/// Role requested by backend clients.
pub const DEFAULT_ROLE: &str = "operator";

/// Default operator scopes requested by backend clients.
pub const DEFAULT_SCOPES: [&str; 3] = ["operator.admin", "operator.approvals", "operator.pairing"];

/// Parameters of the `connect` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    /// Lowest protocol version accepted.
    pub min_protocol: u32,
    /// Highest protocol version accepted.
    pub max_protocol: u32,
    /// Who is connecting.
    pub client: ClientInfo,
    /// Requested role.
    pub role: String,
    /// Requested scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Credentials. Omitted entirely when no token is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthParams>,
}

impl ConnectParams {
    /// Build connect params for the given identity and token.
    ///
    /// An empty token sends no `auth` object at all.
    #[must_use]
    pub fn new(client: ClientInfo, token: &str) -> Self {
        let auth = if token.is_empty() {
            None
        } else {
            Some(AuthParams {
                token: Some(token.to_string()),
            })
        };
        Self {
            min_protocol: PROTOCOL_VERSION,
            max_protocol: PROTOCOL_VERSION,
            client,
            role: DEFAULT_ROLE.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            auth,
        }
    }

    /// Override the requested role and scopes.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>, scopes: Vec<String>) -> Self {
        self.role = role.into();
        self.scopes = scopes;
        self
    }
}

/// Client identity metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client id, e.g. `gateway-client`.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Client version.
    pub version: String,
    /// Platform string.
    pub platform: String,
    /// Client mode, e.g. `backend` or `cli`.
    pub mode: String,
    /// Per-process instance id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// Credentials carried inside the `connect` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    /// Bearer-style gateway token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Successful handshake payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloOk {
    /// Always `hello-ok`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Negotiated protocol version.
    #[serde(default)]
    pub protocol: Option<u32>,
    /// Server metadata.
    #[serde(default)]
    pub server: Option<ServerInfo>,
    /// Methods and events the gateway supports.
    #[serde(default)]
    pub features: Option<Features>,
    /// Initial state snapshot, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Value>,
    /// Connection policy.
    #[serde(default)]
    pub policy: Option<Policy>,
    /// Granted auth.
    #[serde(default)]
    pub auth: Option<GrantedAuth>,
}

impl HelloOk {
    /// Decode and check a hello payload.
    ///
    /// Fails when the payload does not decode or its `type` is not `hello-ok`.
    pub fn from_value(value: Value) -> Result<Self, ProtoError> {
        let hello: Self =
            serde_json::from_value(value).map_err(|e| ProtoError::Decoding(e.to_string()))?;
        hello.validate()?;
        Ok(hello)
    }

    /// Check the payload discriminant.
    pub fn validate(&self) -> Result<(), ProtoError> {
        if self.kind == HELLO_OK {
            Ok(())
        } else {
            Err(ProtoError::Validation(format!(
                "expected hello type '{HELLO_OK}', got '{}'",
                self.kind
            )))
        }
    }

    /// Connection id assigned by the gateway, if any.
    #[must_use]
    pub fn conn_id(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.conn_id.as_deref())
    }

    /// Gateway version, if reported.
    #[must_use]
    pub fn server_version(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.version.as_deref())
    }

    /// Whether the gateway advertises the given method. Gateways that do
    /// not advertise features are assumed to support everything.
    #[must_use]
    pub fn supports_method(&self, method: &str) -> bool {
        self.features
            .as_ref()
            .is_none_or(|f| f.methods.is_empty() || f.methods.iter().any(|m| m == method))
    }
}

/// Gateway server metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// Gateway version.
    #[serde(default)]
    pub version: Option<String>,
    /// Connection id.
    #[serde(default)]
    pub conn_id: Option<String>,
    /// Host name.
    #[serde(default)]
    pub host: Option<String>,
}

/// Advertised capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    /// Supported methods.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Emitted events.
    #[serde(default)]
    pub events: Vec<String>,
}

/// Connection policy announced by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Largest accepted frame.
    #[serde(default)]
    pub max_payload: Option<u64>,
    /// Outbound buffer limit.
    #[serde(default)]
    pub max_buffered_bytes: Option<u64>,
    /// Interval of `tick` events.
    #[serde(default)]
    pub tick_interval_ms: Option<u64>,
}

/// Auth granted by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedAuth {
    /// Device token, when pairing issued one.
    #[serde(default)]
    pub device_token: Option<String>,
    /// Granted role.
    #[serde(default)]
    pub role: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}
