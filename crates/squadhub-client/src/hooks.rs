//! Callbacks a client is constructed with: the event sink and the close and
//! error handlers.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use squadhub_proto::EventFrame;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::GatewayClientError;

/// Error an event sink may return.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every event frame, synchronously, in gateway order.
pub type EventHandler = Arc<dyn Fn(&EventFrame) -> Result<(), SinkError> + Send + Sync>;

/// Called once when an established connection closes, with code and reason.
pub type CloseHandler = Arc<dyn Fn(u16, &str) + Send + Sync>;

/// Called for transport failures and event sink failures.
pub type ErrorHandler = Arc<dyn Fn(&GatewayClientError) + Send + Sync>;

/// Close code reported for a local `close()`.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code reported when the gateway sent a close frame without a status.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Close code reported when the socket died without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Callbacks wired into a client at construction.
#[derive(Clone, Default)]
pub struct ClientHooks {
    pub(crate) on_event: Option<EventHandler>,
    pub(crate) on_close: Option<CloseHandler>,
    pub(crate) on_error: Option<ErrorHandler>,
}

impl fmt::Debug for ClientHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHooks")
            .field("on_event", &self.on_event.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl ClientHooks {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event sink.
    #[must_use]
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventFrame) -> Result<(), SinkError> + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(handler));
        self
    }

    /// Set the close handler.
    #[must_use]
    pub fn on_close<F>(mut self, handler: F) -> Self
    where
        F: Fn(u16, &str) + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(handler));
        self
    }

    /// Set the error handler.
    #[must_use]
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&GatewayClientError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Route events into an unbounded channel instead of a callback.
    #[must_use]
    pub fn event_channel(self) -> (Self, mpsc::UnboundedReceiver<EventFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hooks = self.on_event(move |frame| {
            // A dropped receiver just means nobody listens any more.
            let _ = tx.send(frame.clone());
            Ok(())
        });
        (hooks, rx)
    }

    /// Run `handler` before the currently configured close handler.
    #[must_use]
    pub(crate) fn before_close<F>(mut self, handler: F) -> Self
    where
        F: Fn(u16, &str) + Send + Sync + 'static,
    {
        let next = self.on_close.take();
        self.on_close = Some(Arc::new(move |code, reason| {
            handler(code, reason);
            if let Some(next) = &next {
                next(code, reason);
            }
        }));
        self
    }

    /// Hand an event to the sink. Sink errors and panics go to the error
    /// handler; they never propagate into the read loop.
    pub(crate) fn dispatch_event(&self, frame: &EventFrame) {
        let Some(sink) = &self.on_event else {
            return;
        };
        let failure = match catch_unwind(AssertUnwindSafe(|| sink(frame))) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };
        warn!(event = %frame.event, error = %failure, "event handler failed");
        self.notify_error(&GatewayClientError::EventHandler {
            event: frame.event.clone(),
            message: failure,
        });
    }

    pub(crate) fn notify_close(&self, code: u16, reason: &str) {
        if let Some(handler) = &self.on_close {
            if catch_unwind(AssertUnwindSafe(|| handler(code, reason))).is_err() {
                warn!(code, "close handler panicked");
            }
        }
    }

    pub(crate) fn notify_error(&self, error: &GatewayClientError) {
        if let Some(handler) = &self.on_error {
            if catch_unwind(AssertUnwindSafe(|| handler(error))).is_err() {
                warn!(error = %error, "error handler panicked");
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
