//! CLI error types.

use squadhub_client::GatewayClientError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The gateway or the connection to it failed.
    #[error(transparent)]
    Gateway(#[from] GatewayClientError),
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The command ran but did not succeed.
    #[error("command error: {0}")]
    Command(String),
    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Gateway(e) if e.is_unavailable() => 3,
            Self::Gateway(GatewayClientError::Config(_))
            | Self::Config(_)
            | Self::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_invalid_argument() {
        let err = CliError::InvalidArgument("params must be an object".into());
        assert_eq!(err.to_string(), "invalid argument: params must be an object");
    }

    #[test]
    fn gateway_error_is_transparent() {
        let err = CliError::from(GatewayClientError::NotConnected);
        assert_eq!(err.to_string(), "Gateway not connected");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
        assert_eq!(cli_err.exit_code(), 1);
    }

    #[test]
    fn config_errors_exit_with_usage_code() {
        assert_eq!(CliError::Config("bad".into()).exit_code(), 2);
        let err = CliError::from(GatewayClientError::Config("url cannot be empty".into()));
        assert_eq!(err.exit_code(), 2);
    }
}
