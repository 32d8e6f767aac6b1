//! Chat commands.
//!
//! `chat send` waits for the run's terminal `chat` event unless told not to,
//! so events must be routed into the receiver handed to [`ChatCommand::new`].

use std::io::Write;
use std::time::Duration;

use squadhub_client::GatewayClient;
use squadhub_client::proto::{
    ChatEvent, ChatEventState, ChatMessage, ChatSendParams, EventFrame, GatewayEvent,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::cli::{ChatCommands, ChatSendArgs};
use crate::error::CliError;
use crate::output::{ChatReply, OutputFormat, RawResult};

/// Chat command executor.
pub struct ChatCommand<'a> {
    client: &'a GatewayClient,
    events: &'a mut UnboundedReceiver<EventFrame>,
}

impl<'a> ChatCommand<'a> {
    /// Create a new chat command reading chat events from `events`.
    #[must_use]
    pub fn new(client: &'a GatewayClient, events: &'a mut UnboundedReceiver<EventFrame>) -> Self {
        Self { client, events }
    }

    /// Execute a chat subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request or output fails, the run ends in the
    /// `error` state, or no reply arrives in time.
    pub async fn execute<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ChatCommands,
    ) -> Result<(), CliError> {
        match command {
            ChatCommands::Send(args) => self.send(writer, format, args).await,
            ChatCommands::History { session, limit } => {
                let history = self.client.chat_history(session, *limit).await?;
                format.write(writer, &history)
            }
            ChatCommands::Abort { session, run_id } => {
                let result = self.client.chat_abort(session, run_id.as_deref()).await?;
                format.write(writer, &RawResult(result))
            }
        }
    }

    async fn send<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        args: &ChatSendArgs,
    ) -> Result<(), CliError> {
        let mut params = ChatSendParams::new(&args.session, &args.message);
        params.thinking.clone_from(&args.thinking);
        if args.deliver {
            params.deliver = Some(true);
        }

        let accepted = self.client.chat_send(params).await?;
        if args.no_wait {
            return format.write(writer, &accepted);
        }
        let run_id = accepted.run_id.clone().unwrap_or_default();

        let wait = Duration::from_secs(args.wait_secs);
        let event = tokio::time::timeout(wait, self.wait_for_run(&run_id))
            .await
            .map_err(|_| {
                CliError::Command(format!(
                    "no reply for run {run_id} within {}s",
                    args.wait_secs
                ))
            })??;

        let reply = into_reply(event)?;
        format.write(writer, &reply)
    }

    async fn wait_for_run(&mut self, run_id: &str) -> Result<ChatEvent, CliError> {
        while let Some(frame) = self.events.recv().await {
            match GatewayEvent::decode(&frame) {
                Ok(GatewayEvent::Chat(event)) if event.run_id == run_id => {
                    if event.state.is_terminal() {
                        return Ok(event);
                    }
                    debug!(run_id, seq = event.seq, "chat delta");
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "skipping undecodable event"),
            }
        }
        Err(CliError::Command(
            "event stream ended before the reply finished".into(),
        ))
    }
}

/// Turn a terminal chat event into printable output.
///
/// # Errors
///
/// Returns [`CliError::Command`] for runs that ended in the `error` state.
pub fn into_reply(event: ChatEvent) -> Result<ChatReply, CliError> {
    if event.state == ChatEventState::Error {
        return Err(CliError::Command(format!(
            "run {} failed: {}",
            event.run_id,
            event.error_message.as_deref().unwrap_or("unknown error")
        )));
    }
    Ok(ChatReply {
        text: event.message.as_ref().map(ChatMessage::text),
        run_id: event.run_id,
        state: Some(event.state),
        usage: event.usage,
        stop_reason: event.stop_reason,
    })
}
