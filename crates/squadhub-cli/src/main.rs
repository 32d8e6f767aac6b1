//! squadhub CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use squadhub_cli::CliError;
use squadhub_cli::cli::{Cli, Commands};
use squadhub_cli::commands::call::parse_params;
use squadhub_cli::commands::{
    CallCommand, ChatCommand, CronCommand, HealthCommand, SessionsCommand, WatchCommand,
};
use squadhub_cli::output::OutputFormat;
use squadhub_client::proto::EventFrame;
use squadhub_client::{ClientHooks, GatewayContext, SquadhubConnection};
use tokio::sync::mpsc::UnboundedReceiver;

const DEFAULT_LOG_FILTER: &str = "warn,squadhub_client=info,squadhub_cli=info";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.gateway_config()?;
    let (hooks, mut events) = ClientHooks::new()
        .on_error(|e| warn!(code = e.code(), error = %e, "gateway client error"))
        .event_channel();
    let ctx = GatewayContext::init(config.options().with_hooks(hooks));

    let outcome = dispatch(&cli, &ctx, &config.connection(), &mut events).await;
    ctx.shutdown();
    outcome
}

async fn dispatch(
    cli: &Cli,
    ctx: &GatewayContext,
    connection: &SquadhubConnection,
    events: &mut UnboundedReceiver<EventFrame>,
) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    if let Commands::Watch(args) = &cli.command {
        let mut cmd = WatchCommand::new(ctx.manager(connection)?, events);
        return cmd.execute(&mut stdout, &format, args).await;
    }

    if let Commands::Call(args) = &cli.command {
        parse_params(&args.params)?;
    }

    let client = ctx.shared_client(connection).await?;
    match &cli.command {
        Commands::Health => {
            let cmd = HealthCommand::new(&client);
            cmd.health(&mut stdout, &format).await?;
        }
        Commands::Status => {
            let cmd = HealthCommand::new(&client);
            cmd.status(&mut stdout, &format).await?;
        }
        Commands::Chat { command } => {
            let mut cmd = ChatCommand::new(&client, events);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Sessions { command } => {
            let cmd = SessionsCommand::new(&client);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Cron { command } => {
            let cmd = CronCommand::new(&client);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Call(args) => {
            let cmd = CallCommand::new(&client);
            cmd.execute(&mut stdout, &format, args).await?;
        }
        Commands::Watch(_) => {}
    }

    Ok(())
}
