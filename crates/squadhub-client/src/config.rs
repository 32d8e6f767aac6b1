//! Connection parameters, file/env configuration and runtime client options.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use squadhub_proto::ClientInfo;
use url::Url;

use crate::error::GatewayClientError;
use crate::hooks::ClientHooks;

/// Gateway URL used when nothing else is configured.
pub const DEFAULT_URL: &str = "http://localhost:18790";

/// Environment variable holding the gateway URL.
pub const ENV_URL: &str = "SQUADHUB_URL";
/// Environment variable holding the gateway token.
pub const ENV_TOKEN: &str = "SQUADHUB_TOKEN";
/// Environment variable overriding the request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SQUADHUB_REQUEST_TIMEOUT_MS";

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default deadline for opening the socket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default deadline for the connect handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the gateway lives and how to authenticate to it.
///
/// Also the key under which a [`crate::GatewayContext`] keeps its shared
/// clients.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquadhubConnection {
    /// Gateway base URL (`http(s)://` or `ws(s)://`).
    pub url: String,
    /// Bearer token; empty means unauthenticated.
    #[serde(default)]
    pub token: String,
}

impl fmt::Debug for SquadhubConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SquadhubConnection")
            .field("url", &self.url)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

impl Default for SquadhubConnection {
    fn default() -> Self {
        Self::new(DEFAULT_URL, "")
    }
}

impl SquadhubConnection {
    /// Build connection parameters.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }

    /// Read `SQUADHUB_URL` and `SQUADHUB_TOKEN`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(
            lookup(ENV_URL).unwrap_or_else(|| DEFAULT_URL.to_string()),
            lookup(ENV_TOKEN).unwrap_or_default(),
        )
    }

    /// The WebSocket URL to dial: `http` becomes `ws`, `https` becomes `wss`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayClientError::Config`] for unparsable URLs or other
    /// schemes.
    pub fn websocket_url(&self) -> Result<Url, GatewayClientError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| GatewayClientError::Config(format!("invalid gateway url '{}': {e}", self.url)))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(GatewayClientError::Config(format!(
                    "unsupported gateway url scheme '{other}'"
                )));
            }
        };
        if url.scheme() != scheme {
            url.set_scheme(scheme).map_err(|()| {
                GatewayClientError::Config(format!("cannot rewrite scheme of '{}'", self.url))
            })?;
        }
        Ok(url)
    }
}

/// How this client introduces itself in the connect handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientIdentity {
    /// Client id.
    pub id: String,
    /// Name shown in gateway UIs.
    pub display_name: String,
    /// Client version.
    pub version: String,
    /// Client mode.
    pub mode: String,
    /// Requested role.
    pub role: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            id: "gateway-client".to_string(),
            display_name: "squadhub".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: "backend".to_string(),
            role: squadhub_proto::DEFAULT_ROLE.to_string(),
            scopes: squadhub_proto::DEFAULT_SCOPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl ClientIdentity {
    /// Wire form for one connection; each call gets a fresh instance id.
    #[must_use]
    pub fn client_info(&self) -> ClientInfo {
        ClientInfo {
            id: self.id.clone(),
            display_name: Some(self.display_name.clone()),
            version: self.version.clone(),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            mode: self.mode.clone(),
            instance_id: Some(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Serializable client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway URL.
    pub url: String,
    /// Gateway token.
    pub token: String,
    /// Per-request deadline.
    pub request_timeout_ms: u64,
    /// Socket open deadline.
    pub connect_timeout_ms: u64,
    /// Handshake deadline.
    pub handshake_timeout_ms: u64,
    /// Handshake identity.
    pub client: ClientIdentity,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            token: String::new(),
            request_timeout_ms: millis(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout_ms: millis(DEFAULT_CONNECT_TIMEOUT),
            handshake_timeout_ms: millis(DEFAULT_HANDSHAKE_TIMEOUT),
            client: ClientIdentity::default(),
        }
    }
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl GatewayConfig {
    /// Load configuration from a TOML file, or JSON when the file ends in
    /// `.json`. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayClientError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GatewayClientError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let is_json = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, GatewayClientError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GatewayClientError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(content: &str) -> Result<Self, GatewayClientError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| GatewayClientError::Config(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `SQUADHUB_URL`, `SQUADHUB_TOKEN` and
    /// `SQUADHUB_REQUEST_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, GatewayClientError> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides on top of `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GatewayClientError> {
        if let Some(url) = lookup(ENV_URL) {
            self.url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = token;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.request_timeout_ms = raw.trim().parse().map_err(|e| {
                GatewayClientError::Config(format!("{ENV_REQUEST_TIMEOUT_MS}='{raw}': {e}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), GatewayClientError> {
        if self.url.trim().is_empty() {
            return Err(GatewayClientError::Config("url cannot be empty".to_string()));
        }

        self.connection().websocket_url()?;

        for (name, value) in [
            ("request_timeout_ms", self.request_timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("handshake_timeout_ms", self.handshake_timeout_ms),
        ] {
            if value == 0 {
                return Err(GatewayClientError::Config(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.client.id.is_empty() {
            return Err(GatewayClientError::Config("client.id cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Connection parameters.
    #[must_use]
    pub fn connection(&self) -> SquadhubConnection {
        SquadhubConnection::new(self.url.clone(), self.token.clone())
    }

    /// Runtime options, without callbacks.
    #[must_use]
    pub fn options(&self) -> GatewayClientOptions {
        GatewayClientOptions {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            identity: self.client.clone(),
            hooks: ClientHooks::default(),
        }
    }
}

/// Runtime options a client is built with (everything except url and token).
#[derive(Debug, Clone)]
pub struct GatewayClientOptions {
    /// Per-request deadline.
    pub request_timeout: Duration,
    /// Socket open deadline.
    pub connect_timeout: Duration,
    /// Handshake deadline.
    pub handshake_timeout: Duration,
    /// Handshake identity.
    pub identity: ClientIdentity,
    /// Event, close and error callbacks.
    pub hooks: ClientHooks,
}

impl Default for GatewayClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            identity: ClientIdentity::default(),
            hooks: ClientHooks::default(),
        }
    }
}

impl GatewayClientOptions {
    /// Set the per-request deadline.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the socket open deadline.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the handshake deadline.
    #[must_use]
    pub const fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the handshake identity.
    #[must_use]
    pub fn with_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Set the callbacks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: ClientHooks) -> Self {
        self.hooks = hooks;
        self
    }
}
