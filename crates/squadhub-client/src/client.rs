//! Gateway WebSocket client.
//!
//! One [`GatewayClient`] owns at most one socket. After the `connect`
//! handshake a single I/O task drives the socket: it writes queued request
//! frames, routes responses to their waiting callers by id and hands event
//! frames to the configured sink. Requests are multiplexed; the gateway may
//! answer them in any order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::{FutureExt, SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use squadhub_proto::{methods, ConnectParams, Frame, HelloOk, RequestFrame};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::{millis, GatewayClientOptions, SquadhubConnection};
use crate::error::GatewayClientError;
use crate::hooks::{CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_NO_STATUS};
use crate::pending::PendingRequests;
use crate::state::{AtomicConnectionState, ConnectionState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ConnectAttempt = Shared<BoxFuture<'static, Result<(), GatewayClientError>>>;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Multiplexed request/response client for one squadhub gateway.
///
/// Cheap to clone; clones share the same connection. Dropping the last clone
/// closes it.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<Inner>,
    _last: Arc<CloseOnDrop>,
}

/// Shared by every clone of one client; the I/O task holds only `Inner`.
struct CloseOnDrop(Arc<Inner>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

struct Inner {
    id: u64,
    connection: SquadhubConnection,
    options: GatewayClientOptions,
    state: AtomicConnectionState,
    pending: PendingRequests,
    /// Queue into the I/O task; present only while connected.
    outgoing: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    hello: Mutex<Option<HelloOk>>,
    connecting: Mutex<Option<(u64, ConnectAttempt)>>,
    attempts: AtomicU64,
    closed: watch::Sender<bool>,
}

/// How the I/O loop ended.
enum LinkEnd {
    Local,
    Remote { code: u16, reason: String },
    Failed(String),
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("id", &self.inner.id)
            .field("url", &self.inner.connection.url)
            .field("state", &self.inner.state.load())
            .field("pending", &self.inner.pending.len())
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a disconnected client.
    #[must_use]
    pub fn new(connection: SquadhubConnection, options: GatewayClientOptions) -> Self {
        let inner = Arc::new(Inner {
            id: NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed),
            connection,
            options,
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
            pending: PendingRequests::new(),
            outgoing: Mutex::new(None),
            hello: Mutex::new(None),
            connecting: Mutex::new(None),
            attempts: AtomicU64::new(0),
            closed: watch::Sender::new(false),
        });
        Self {
            _last: Arc::new(CloseOnDrop(Arc::clone(&inner))),
            inner,
        }
    }

    /// Process-unique id of this client. Clones share it.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Configured gateway URL, as given.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.connection.url
    }

    /// Connection parameters this client was built with.
    #[must_use]
    pub fn connection(&self) -> &SquadhubConnection {
        &self.inner.connection
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state.load()
    }

    /// True only while the handshake has completed and the socket is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.state.load() == ConnectionState::Connected
    }

    /// Hello payload negotiated by the last successful handshake.
    #[must_use]
    pub fn hello(&self) -> Option<HelloOk> {
        self.inner.hello.lock().clone()
    }

    /// Number of requests awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Open the socket and perform the `connect` handshake.
    ///
    /// Returns immediately when already connected. Concurrent callers share
    /// one attempt; a second socket is never opened.
    ///
    /// # Errors
    ///
    /// - [`GatewayClientError::Transport`] if the socket cannot be opened.
    /// - [`GatewayClientError::Handshake`] on handshake timeout, malformed
    ///   hello or early close.
    /// - [`GatewayClientError::AuthRejected`] if the gateway refuses.
    /// - [`GatewayClientError::ConnectionClosed`] if the client was closed.
    pub async fn connect(&self) -> Result<(), GatewayClientError> {
        let attempt = {
            let mut slot = self.inner.connecting.lock();
            match self.inner.state.load() {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Closing | ConnectionState::Closed => {
                    return Err(GatewayClientError::ConnectionClosed);
                }
                ConnectionState::Disconnected | ConnectionState::Connecting => {}
            }
            if let Some((_, attempt)) = slot.as_ref() {
                attempt.clone()
            } else {
                let number = self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                let inner = Arc::clone(&self.inner);
                let attempt = async move {
                    let outcome = inner.establish().await;
                    let mut slot = inner.connecting.lock();
                    if slot.as_ref().is_some_and(|(n, _)| *n == number) {
                        *slot = None;
                    }
                    outcome
                }
                .boxed()
                .shared();
                *slot = Some((number, attempt.clone()));
                attempt
            }
        };
        attempt.await
    }

    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// - [`GatewayClientError::NotConnected`] if not connected; nothing is sent.
    /// - [`GatewayClientError::Protocol`] for `connect` on a live connection,
    ///   which only the handshake may send.
    /// - [`GatewayClientError::Gateway`] if the gateway answers with an error.
    /// - [`GatewayClientError::Timeout`] if no response arrives in time.
    /// - [`GatewayClientError::ConnectionLost`] or
    ///   [`GatewayClientError::ConnectionClosed`] if the connection goes away
    ///   while waiting.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, GatewayClientError> {
        if !self.is_connected() {
            return Err(GatewayClientError::NotConnected);
        }
        if method == methods::CONNECT {
            return Err(GatewayClientError::Protocol(
                "'connect' may only be sent by the handshake".to_string(),
            ));
        }

        let inner = &self.inner;
        let id = Uuid::new_v4().to_string();
        let text = RequestFrame::new(id.clone(), method, params).to_json()?;
        let reply = inner.pending.register(&id, method)?;
        let _guard = AbandonOnDrop {
            pending: &inner.pending,
            id: &id,
        };

        let queued = inner
            .outgoing
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(Message::Text(text.into())).is_ok());
        if !queued {
            return Err(GatewayClientError::NotConnected);
        }
        trace!(id = %id, method, "request sent");

        let deadline = inner.options.request_timeout;
        match timeout(deadline, reply).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(GatewayClientError::ConnectionLost {
                reason: "reply dropped".to_string(),
            }),
            Err(_) => {
                debug!(id = %id, method, timeout_ms = millis(deadline), "request timed out");
                Err(GatewayClientError::Timeout {
                    method: method.to_string(),
                    timeout: deadline,
                })
            }
        }
    }

    /// Typed [`request`](Self::request): serialize `params`, deserialize the
    /// result into `R`.
    ///
    /// # Errors
    ///
    /// Everything [`request`](Self::request) returns, plus
    /// [`GatewayClientError::Serialization`] when either side does not fit.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, GatewayClientError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        let result = self.request(method, params).await?;
        serde_json::from_value(result).map_err(|e| {
            GatewayClientError::Serialization(format!("unexpected '{method}' result: {e}"))
        })
    }

    /// Close the connection and fail every pending request with
    /// [`GatewayClientError::ConnectionClosed`].
    ///
    /// Idempotent. Does nothing unless connecting or connected.
    pub fn close(&self) {
        self.inner.close();
    }
}

impl Inner {
    fn close(&self) {
        loop {
            let current = self.state.load();
            if !matches!(current, ConnectionState::Connected | ConnectionState::Connecting) {
                return;
            }
            if self.state.transition(current, ConnectionState::Closing).is_ok() {
                break;
            }
        }

        self.outgoing.lock().take();
        let rejected = self.pending.reject_all(&GatewayClientError::ConnectionClosed);
        self.closed.send_replace(true);
        self.state.store(ConnectionState::Closed);
        debug!(client = self.id, rejected, "gateway client closed");
    }

    async fn establish(self: &Arc<Self>) -> Result<(), GatewayClientError> {
        if let Err(current) = self
            .state
            .transition(ConnectionState::Disconnected, ConnectionState::Connecting)
        {
            return match current {
                ConnectionState::Connected => Ok(()),
                _ => Err(GatewayClientError::ConnectionClosed),
            };
        }

        let opened = tokio::select! {
            biased;
            () = closed_signal(self.closed.subscribe()) => Err(GatewayClientError::ConnectionClosed),
            opened = self.open() => opened,
        };

        let (mut ws, hello) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                let _ = self
                    .state
                    .transition(ConnectionState::Connecting, ConnectionState::Disconnected);
                warn!(url = %self.connection.url, error = %e, "gateway connect failed");
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        *self.outgoing.lock() = Some(tx);
        if self
            .state
            .transition(ConnectionState::Connecting, ConnectionState::Connected)
            .is_err()
        {
            self.outgoing.lock().take();
            let _ = ws.close(None).await;
            return Err(GatewayClientError::ConnectionClosed);
        }

        info!(
            url = %self.connection.url,
            conn_id = hello.conn_id().unwrap_or("-"),
            server_version = hello.server_version().unwrap_or("-"),
            "connected to squadhub gateway"
        );
        *self.hello.lock() = Some(hello);
        tokio::spawn(Arc::clone(self).run(ws, rx));
        Ok(())
    }

    async fn open(&self) -> Result<(WsStream, HelloOk), GatewayClientError> {
        let url = self.connection.websocket_url()?;
        let (mut ws, _) = timeout(self.options.connect_timeout, tokio_tungstenite::connect_async(url.as_str()))
            .await
            .map_err(|_| {
                GatewayClientError::Transport(format!(
                    "connecting to {url} timed out after {}ms",
                    millis(self.options.connect_timeout)
                ))
            })?
            .map_err(|e| GatewayClientError::Transport(format!("failed to connect to {url}: {e}")))?;

        debug!(url = %url, "socket open, sending connect");
        match timeout(self.options.handshake_timeout, self.handshake(&mut ws)).await {
            Ok(Ok(hello)) => Ok((ws, hello)),
            Ok(Err(e)) => {
                let _ = ws.close(None).await;
                Err(e)
            }
            Err(_) => {
                let _ = ws.close(None).await;
                Err(GatewayClientError::Handshake(format!(
                    "no hello from {url} within {}ms",
                    millis(self.options.handshake_timeout)
                )))
            }
        }
    }

    async fn handshake(&self, ws: &mut WsStream) -> Result<HelloOk, GatewayClientError> {
        let identity = &self.options.identity;
        let params = ConnectParams::new(identity.client_info(), &self.connection.token)
            .with_role(identity.role.clone(), identity.scopes.clone());
        let id = Uuid::new_v4().to_string();
        let text = RequestFrame::new(id.clone(), methods::CONNECT, serde_json::to_value(&params)?)
            .to_json()?;

        ws.send(Message::Text(text.into()))
            .await
            .map_err(|e| GatewayClientError::Handshake(format!("failed to send connect: {e}")))?;

        while let Some(message) = ws.next().await {
            let message = message
                .map_err(|e| GatewayClientError::Handshake(format!("transport error: {e}")))?;
            let text = match message {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    let (code, reason) = describe_close(frame.as_ref());
                    return Err(GatewayClientError::Handshake(format!(
                        "gateway closed the socket ({code} {reason})"
                    )));
                }
                _ => continue,
            };
            match Frame::parse(text.as_str()) {
                Some(Frame::Response(response)) if response.id == id => {
                    return match response.into_result() {
                        Ok(payload) => HelloOk::from_value(payload).map_err(|e| {
                            GatewayClientError::Handshake(format!("malformed hello: {e}"))
                        }),
                        Err(refusal) => Err(GatewayClientError::AuthRejected(refusal)),
                    };
                }
                Some(other) => trace!(kind = other.kind(), "ignoring frame before hello"),
                None => debug!("ignoring malformed frame before hello"),
            }
        }

        Err(GatewayClientError::Handshake(
            "socket closed before hello".to_string(),
        ))
    }

    async fn run(self: Arc<Self>, mut ws: WsStream, mut outgoing: mpsc::UnboundedReceiver<Message>) {
        let closed = closed_signal(self.closed.subscribe());
        tokio::pin!(closed);

        let end = loop {
            tokio::select! {
                biased;
                () = &mut closed => break LinkEnd::Local,
                Some(message) = outgoing.recv() => {
                    if let Err(e) = ws.send(message).await {
                        break LinkEnd::Failed(format!("write failed: {e}"));
                    }
                }
                incoming = ws.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = describe_close(frame.as_ref());
                        break LinkEnd::Remote { code, reason };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break LinkEnd::Failed(e.to_string()),
                    None => break LinkEnd::Failed("socket stream ended".to_string()),
                },
            }
        };

        self.finish(ws, end).await;
    }

    fn dispatch(&self, text: &str) {
        match Frame::parse(text) {
            Some(Frame::Response(response)) => {
                let id = response.id.clone();
                if !self.pending.resolve(response) {
                    debug!(id = %id, "dropping response for unknown request");
                }
            }
            Some(Frame::Event(event)) => {
                if self.state.load() == ConnectionState::Connected {
                    self.options.hooks.dispatch_event(&event);
                }
            }
            Some(Frame::Request(request)) => {
                debug!(method = %request.method, "ignoring request frame from gateway");
            }
            None => debug!(len = text.len(), "dropping malformed frame"),
        }
    }

    async fn finish(&self, mut ws: WsStream, end: LinkEnd) {
        let previous = self.state.swap(ConnectionState::Closed);
        self.outgoing.lock().take();

        let (code, reason) = match end {
            LinkEnd::Local => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client closed".into(),
                };
                let _ = ws.close(Some(frame)).await;
                (CLOSE_NORMAL, "client closed".to_string())
            }
            LinkEnd::Remote { code, reason } => {
                let _ = ws.close(None).await;
                (code, reason)
            }
            LinkEnd::Failed(message) => {
                self.options
                    .hooks
                    .notify_error(&GatewayClientError::Transport(message.clone()));
                (CLOSE_ABNORMAL, message)
            }
        };

        if previous == ConnectionState::Connected {
            let rejected = self.pending.reject_all(&GatewayClientError::ConnectionLost {
                reason: reason.clone(),
            });
            warn!(url = %self.connection.url, code, reason = %reason, rejected, "gateway connection lost");
        } else {
            debug!(url = %self.connection.url, code, "gateway socket closed");
        }

        self.options.hooks.notify_close(code, &reason);
    }
}

/// Removes the pending entry if the caller stops waiting for any reason.
struct AbandonOnDrop<'a> {
    pending: &'a PendingRequests,
    id: &'a str,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        self.pending.abandon(self.id);
    }
}

async fn closed_signal(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|closed| *closed).await;
}

fn describe_close(frame: Option<&CloseFrame>) -> (u16, String) {
    frame.map_or_else(
        || (CLOSE_NO_STATUS, String::new()),
        |f| (u16::from(f.code), f.reason.as_str().to_string()),
    )
}
