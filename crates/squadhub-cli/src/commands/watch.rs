//! Event streaming.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use squadhub_client::SharedClientManager;
use squadhub_client::proto::EventFrame;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output::{EventLine, OutputFormat};

/// Lower bound for the reconnect check interval.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Watch command executor.
///
/// Keeps the manager's shared client alive: whenever the connection is gone
/// on an interval tick, it asks the manager for a fresh one.
pub struct WatchCommand<'a> {
    manager: Arc<SharedClientManager>,
    events: &'a mut UnboundedReceiver<EventFrame>,
}

impl<'a> WatchCommand<'a> {
    /// Create a new watch command.
    #[must_use]
    pub fn new(
        manager: Arc<SharedClientManager>,
        events: &'a mut UnboundedReceiver<EventFrame>,
    ) -> Self {
        Self { manager, events }
    }

    /// Execute `watch` until ctrl-c, or until `--count` events were printed.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails, or a reconnect fails for a reason
    /// other than the gateway being unavailable.
    pub async fn execute<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        args: &WatchArgs,
    ) -> Result<(), CliError> {
        let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms).max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut printed = 0_u64;

        loop {
            tokio::select! {
                frame = self.events.recv() => {
                    let Some(frame) = frame else {
                        return Ok(());
                    };
                    if args.event.as_ref().is_some_and(|name| *name != frame.event) {
                        continue;
                    }
                    let line = EventLine {
                        event: frame.event,
                        seq: frame.seq,
                        data: frame.data,
                    };
                    format.write_line(writer, &line)?;
                    printed += 1;
                    if args.count.is_some_and(|count| printed >= count) {
                        return Ok(());
                    }
                }
                _ = ticker.tick() => self.ensure_connected().await?,
                _ = tokio::signal::ctrl_c() => {
                    info!(printed, "interrupted");
                    return Ok(());
                }
            }
        }
    }

    async fn ensure_connected(&self) -> Result<(), CliError> {
        if self.manager.current().is_some() {
            return Ok(());
        }
        match self.manager.get().await {
            Ok(client) => {
                info!(url = %client.url(), client = client.id(), "watching gateway events");
                Ok(())
            }
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, "gateway unavailable, retrying");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
