//! Gateway health and status commands.

use std::io::Write;

use squadhub_client::GatewayClient;

use crate::error::CliError;
use crate::output::{OutputFormat, RawResult};

/// Health and status command executor.
pub struct HealthCommand<'a> {
    client: &'a GatewayClient,
}

impl<'a> HealthCommand<'a> {
    /// Create a new health command.
    #[must_use]
    pub const fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// Execute `health`. An unhealthy gateway is reported as a command error
    /// after the table is printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or output fails, or the gateway
    /// reports itself unhealthy.
    pub async fn health<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let health = self.client.health().await?;
        format.write(writer, &health)?;
        if health.ok {
            Ok(())
        } else {
            Err(CliError::Command("gateway reports unhealthy".into()))
        }
    }

    /// Execute `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or output fails.
    pub async fn status<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let status = self.client.status().await?;
        format.write(writer, &RawResult(status))
    }
}
