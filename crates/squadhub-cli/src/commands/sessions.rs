//! Session commands.

use std::io::Write;

use squadhub_client::GatewayClient;
use squadhub_client::proto::SessionsListParams;

use crate::cli::SessionsCommands;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Sessions command executor.
pub struct SessionsCommand<'a> {
    client: &'a GatewayClient,
}

impl<'a> SessionsCommand<'a> {
    /// Create a new sessions command.
    #[must_use]
    pub const fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// Execute a sessions subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &SessionsCommands,
    ) -> Result<(), CliError> {
        match command {
            SessionsCommands::List {
                limit,
                active_minutes,
            } => {
                let params = SessionsListParams {
                    limit: *limit,
                    active_minutes: *active_minutes,
                };
                let sessions = self.client.sessions_list(&params).await?;
                format.write(writer, &sessions)
            }
        }
    }
}
