//! Mock squadhub gateway for integration tests.
//!
//! Speaks just enough of the protocol: answers the `connect` handshake and a
//! handful of scripted methods that let tests exercise ordering, timeouts,
//! events and connection loss.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use squadhub_client::{GatewayClientOptions, SquadhubConnection};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

/// Token the mock accepts by default.
pub const TOKEN: &str = "secret";

/// How the mock answers the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloMode {
    /// Proper hello-ok.
    Ok,
    /// `ok:true` with a payload that is not a hello.
    Malformed,
    /// Never answer.
    Silent,
    /// Close the socket instead of answering.
    Close,
}

/// Mock behavior.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub token: String,
    pub hello: HelloMode,
    /// Send a `connect.challenge` event before the hello.
    pub challenge: bool,
    /// Delay before answering the handshake.
    pub hello_delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            token: TOKEN.to_string(),
            hello: HelloMode::Ok,
            challenge: false,
            hello_delay: Duration::ZERO,
        }
    }
}

struct State {
    config: MockConfig,
    handshakes: AtomicUsize,
    connect_params: Mutex<Vec<Value>>,
    kill: broadcast::Sender<u16>,
}

/// A mock gateway bound to an ephemeral local port.
pub struct MockGateway {
    addr: SocketAddr,
    state: Arc<State>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl MockGateway {
    /// Start with the default configuration.
    pub async fn start() -> Self {
        Self::start_with(MockConfig::default()).await
    }

    /// Start with `config`.
    pub async fn start_with(config: MockConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock gateway");
        let addr = listener.local_addr().expect("no local addr");
        let (kill, _) = broadcast::channel(8);
        let state = Arc::new(State {
            config,
            handshakes: AtomicUsize::new(0),
            connect_params: Mutex::new(Vec::new()),
            kill,
        });

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&accept_state);
                tokio::spawn(serve(stream, state));
            }
        });

        Self { addr, state, task }
    }

    /// `http://` URL, so the client's scheme mapping is exercised too.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Connection with the accepted token.
    pub fn connection(&self) -> SquadhubConnection {
        SquadhubConnection::new(self.url(), self.state.config.token.clone())
    }

    /// Connection with a wrong token.
    pub fn bad_connection(&self) -> SquadhubConnection {
        SquadhubConnection::new(self.url(), "wrong-token")
    }

    /// Number of `connect` requests received.
    pub fn handshakes(&self) -> usize {
        self.state.handshakes.load(Ordering::SeqCst)
    }

    /// Params of every `connect` request received.
    pub fn connect_params(&self) -> Vec<Value> {
        self.state.connect_params.lock().clone()
    }

    /// Close every live connection with the given close code.
    pub fn drop_all(&self, code: u16) {
        let _ = self.state.kill.send(code);
    }
}

/// Options with short deadlines for tests.
pub fn fast_options() -> GatewayClientOptions {
    GatewayClientOptions::default()
        .with_connect_timeout(Duration::from_secs(2))
        .with_handshake_timeout(Duration::from_secs(2))
        .with_request_timeout(Duration::from_secs(2))
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn eventually(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

fn res_ok(id: &str, payload: Value) -> Message {
    Message::Text(json!({"type": "res", "id": id, "ok": true, "payload": payload}).to_string().into())
}

fn res_err(id: &str, code: &str, message: &str) -> Message {
    Message::Text(
        json!({"type": "res", "id": id, "ok": false, "error": {"code": code, "message": message}})
            .to_string()
            .into(),
    )
}

fn event(name: &str, seq: u64, payload: Value) -> Message {
    Message::Text(
        json!({"type": "event", "event": name, "seq": seq, "payload": payload})
            .to_string()
            .into(),
    )
}

fn hello(conn: usize) -> Value {
    json!({
        "type": "hello-ok",
        "protocol": 3,
        "server": {"version": "2026.1.0", "connId": format!("conn-{conn}")},
        "features": {"methods": ["health", "chat.send", "chat.history", "cron.list"], "events": ["chat", "tick"]},
        "policy": {"maxPayload": 1_048_576, "tickIntervalMs": 30_000}
    })
}

async fn serve(stream: TcpStream, state: Arc<State>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    let mut kill = state.kill.subscribe();

    if state.config.challenge {
        let _ = ws.send(event("connect.challenge", 0, json!({"nonce": "abc"}))).await;
    }

    if handshake(&mut ws, &state).await.is_none() {
        return;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    loop {
        tokio::select! {
            code = kill.recv() => {
                let code = code.unwrap_or(1012);
                let _ = ws.close(Some(CloseFrame { code: CloseCode::from(code), reason: "service restart".into() })).await;
                return;
            }
            Some(out) = rx.recv() => {
                if ws.send(out).await.is_err() {
                    return;
                }
            }
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
                        continue;
                    };
                    if !handle(&mut ws, &tx, &frame).await {
                        return;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Returns the connect request id once a hello-ok was sent.
async fn handshake(ws: &mut WebSocketStream<TcpStream>, state: &State) -> Option<String> {
    let text = match ws.next().await? {
        Ok(Message::Text(text)) => text,
        _ => return None,
    };
    let frame: Value = serde_json::from_str(text.as_str()).ok()?;
    if frame["method"] != "connect" {
        return None;
    }
    let id = frame["id"].as_str()?.to_string();
    let conn = state.handshakes.fetch_add(1, Ordering::SeqCst) + 1;
    state.connect_params.lock().push(frame["params"].clone());

    if !state.config.hello_delay.is_zero() {
        tokio::time::sleep(state.config.hello_delay).await;
    }

    let presented = frame["params"]["auth"]["token"].as_str().unwrap_or("");
    if presented != state.config.token {
        let _ = ws.send(res_err(&id, "UNAUTHORIZED", "invalid token")).await;
        let _ = ws.close(None).await;
        return None;
    }

    match state.config.hello {
        HelloMode::Ok => {
            ws.send(res_ok(&id, hello(conn))).await.ok()?;
            Some(id)
        }
        HelloMode::Malformed => {
            let _ = ws.send(res_ok(&id, json!({"type": "welcome"}))).await;
            // Keep the socket open; the client is expected to hang up.
            while let Some(Ok(_)) = ws.next().await {}
            None
        }
        HelloMode::Silent => {
            while let Some(Ok(_)) = ws.next().await {}
            None
        }
        HelloMode::Close => {
            let _ = ws
                .close(Some(CloseFrame {
                    code: CloseCode::Policy,
                    reason: "go away".into(),
                }))
                .await;
            None
        }
    }
}

/// Answer one request. Returns `false` when the socket should go away.
async fn handle(
    ws: &mut WebSocketStream<TcpStream>,
    tx: &mpsc::UnboundedSender<Message>,
    frame: &Value,
) -> bool {
    let id = frame["id"].as_str().unwrap_or_default().to_string();
    let params = frame["params"].clone();
    let method = frame["method"].as_str().unwrap_or_default();

    let reply = match method {
        "echo" => res_ok(&id, params),
        "delay" => {
            let ms = params["ms"].as_u64().unwrap_or(0);
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                let _ = tx.send(res_ok(&id, json!({"ms": ms})));
            });
            return true;
        }
        "silent" => return true,
        "fail" => res_err(&id, "INVALID_REQUEST", "bad params"),
        "stale" => {
            if ws.send(res_ok("no-such-request", json!({"stale": true}))).await.is_err() {
                return false;
            }
            res_ok(&id, json!({"fresh": true}))
        }
        "malformed" => {
            for junk in ["not json", "{\"type\":\"bogus\"}", "{\"id\":\"x\"}"] {
                if ws.send(Message::Text(junk.into())).await.is_err() {
                    return false;
                }
            }
            res_ok(&id, json!({"survived": true}))
        }
        "emit" => {
            let count = params["count"].as_u64().unwrap_or(0);
            for seq in 0..count {
                if ws.send(event("tick", seq, json!({"n": seq}))).await.is_err() {
                    return false;
                }
            }
            res_ok(&id, json!({"emitted": count}))
        }
        "drop" => return false,
        "health" => res_ok(
            &id,
            json!({"ok": true, "ts": 1_700_000_000_000_u64, "durationMs": 3,
                   "channels": {"telegram": {"configured": true, "running": true, "connected": true}}}),
        ),
        "chat.send" => {
            let run = params["idempotencyKey"].as_str().unwrap_or_default().to_string();
            let session = params["sessionKey"].as_str().unwrap_or_default().to_string();
            if ws.send(res_ok(&id, json!({"runId": run, "status": "started"}))).await.is_err() {
                return false;
            }
            let delta = json!({"runId": run, "sessionKey": session, "seq": 1, "state": "delta",
                "message": {"role": "assistant", "content": [{"type": "text", "text": "Hel"}]}});
            let done = json!({"runId": run, "sessionKey": session, "seq": 2, "state": "final",
                "message": {"role": "assistant", "content": [{"type": "text", "text": "Hello"}]},
                "usage": {"input": 5, "output": 2}});
            if ws.send(event("chat", 1, delta)).await.is_err() {
                return false;
            }
            event("chat", 2, done)
        }
        "chat.history" => res_ok(
            &id,
            json!({"sessionKey": params["sessionKey"], "messages": [
                {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                {"role": "assistant", "content": [{"type": "text", "text": "hello"}]}
            ]}),
        ),
        "sessions.list" => res_ok(
            &id,
            json!({"sessions": [{"key": "agent:main:main", "kind": "direct"}], "count": 1}),
        ),
        "cron.list" => res_ok(&id, json!({"jobs": []})),
        _ => res_err(&id, "UNKNOWN_METHOD", "unknown method"),
    };

    ws.send(reply).await.is_ok()
}
