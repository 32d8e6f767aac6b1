//! Cron job commands.

use std::io::Write;

use squadhub_client::GatewayClient;

use crate::cli::CronCommands;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Cron command executor.
pub struct CronCommand<'a> {
    client: &'a GatewayClient,
}

impl<'a> CronCommand<'a> {
    /// Create a new cron command.
    #[must_use]
    pub const fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// Execute a cron subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &CronCommands,
    ) -> Result<(), CliError> {
        match command {
            CronCommands::List => {
                let jobs = self.client.cron_list().await?;
                format.write(writer, &jobs)
            }
        }
    }
}
