//! Raw method calls.

use std::io::Write;

use serde_json::Value;
use squadhub_client::GatewayClient;

use crate::cli::CallArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, RawResult};

/// Call command executor.
pub struct CallCommand<'a> {
    client: &'a GatewayClient,
}

impl<'a> CallCommand<'a> {
    /// Create a new call command.
    #[must_use]
    pub const fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// Execute `call`.
    ///
    /// # Errors
    ///
    /// Returns an error if the params are not a JSON object, or the request
    /// or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &CallArgs,
    ) -> Result<(), CliError> {
        let params = parse_params(&args.params)?;
        let result = self.client.request(&args.method, params).await?;
        format.write(writer, &RawResult(result))
    }
}

/// Parse `--params`, which must be a JSON object.
///
/// # Errors
///
/// Returns [`CliError::InvalidArgument`] for invalid JSON or a non-object.
pub fn parse_params(raw: &str) -> Result<Value, CliError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CliError::InvalidArgument(format!("params are not valid JSON: {e}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(CliError::InvalidArgument("params must be a JSON object".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_object_params() {
        assert_eq!(
            parse_params(r#"{"sessionKey":"main","limit":5}"#).unwrap(),
            json!({"sessionKey": "main", "limit": 5})
        );
    }

    #[test]
    fn rejects_non_object_params() {
        assert!(matches!(
            parse_params("[1, 2]"),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_params("{oops").unwrap_err();
        assert!(err.to_string().starts_with("invalid argument: params are not valid JSON"));
    }
}
