//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use squadhub_client::GatewayConfig;

use crate::error::CliError;

/// squadhub gateway command-line client.
#[derive(Parser, Debug, Clone)]
#[command(name = "squadhub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Gateway URL (`http(s)://` or `ws(s)://`).
    #[arg(short, long, env = "SQUADHUB_URL")]
    pub url: Option<String>,

    /// Gateway token.
    #[arg(short, long, env = "SQUADHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// TOML (or `.json`) configuration file; flags and environment
    /// override it.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "SQUADHUB_REQUEST_TIMEOUT_MS", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show gateway and channel health.
    Health,

    /// Show the gateway status summary.
    Status,

    /// Chat with an agent session.
    Chat {
        /// Chat subcommand to execute.
        #[command(subcommand)]
        command: ChatCommands,
    },

    /// Session commands.
    Sessions {
        /// Sessions subcommand to execute.
        #[command(subcommand)]
        command: SessionsCommands,
    },

    /// Cron job commands.
    Cron {
        /// Cron subcommand to execute.
        #[command(subcommand)]
        command: CronCommands,
    },

    /// Call any gateway method with raw JSON params.
    Call(CallArgs),

    /// Print gateway events as they arrive, reconnecting when the gateway
    /// goes away.
    Watch(WatchArgs),
}

/// Chat subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ChatCommands {
    /// Send a message and print the reply.
    Send(ChatSendArgs),

    /// Show a session's history.
    History {
        /// Session key.
        session: String,

        /// Maximum number of messages.
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Abort a running turn.
    Abort {
        /// Session key.
        session: String,

        /// Run to abort; the active run when omitted.
        #[arg(long)]
        run_id: Option<String>,
    },
}

/// Arguments for `chat send`.
#[derive(Parser, Debug, Clone)]
pub struct ChatSendArgs {
    /// Session key.
    pub session: String,

    /// Message text.
    pub message: String,

    /// Thinking level override.
    #[arg(long)]
    pub thinking: Option<String>,

    /// Also deliver the reply to the session's channel.
    #[arg(long)]
    pub deliver: bool,

    /// Return after the gateway accepts the message.
    #[arg(long)]
    pub no_wait: bool,

    /// How long to wait for the reply, in seconds.
    #[arg(long, default_value_t = 120)]
    pub wait_secs: u64,
}

/// Sessions subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SessionsCommands {
    /// List sessions.
    List {
        /// Maximum number of sessions.
        #[arg(short, long)]
        limit: Option<u32>,

        /// Only sessions active within this many minutes.
        #[arg(long)]
        active_minutes: Option<u32>,
    },
}

/// Cron subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum CronCommands {
    /// List cron jobs.
    List,
}

/// Arguments for `call`.
#[derive(Parser, Debug, Clone)]
pub struct CallArgs {
    /// Method name, e.g. `health` or `chat.history`.
    pub method: String,

    /// Params as a JSON object.
    #[arg(short, long, default_value = "{}")]
    pub params: String,
}

/// Arguments for `watch`.
#[derive(Parser, Debug, Clone)]
pub struct WatchArgs {
    /// How often to check the connection, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub interval_ms: u64,

    /// Only print events with this name.
    #[arg(short, long)]
    pub event: Option<String>,

    /// Exit after this many events.
    #[arg(short = 'n', long)]
    pub count: Option<u64>,
}

impl Cli {
    /// Gateway configuration: the `--config` file (or defaults), then the
    /// URL, token and timeout flags, which clap already fills from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result is
    /// invalid.
    pub fn gateway_config(&self) -> Result<GatewayConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::from_file(path)?,
            None => GatewayConfig::default(),
        };
        if let Some(url) = &self.url {
            config.url.clone_from(url);
        }
        if let Some(token) = &self.token {
            config.token.clone_from(token);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.request_timeout_ms = timeout_ms;
        }
        config.validate()?;
        Ok(config)
    }
}
