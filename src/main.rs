use anyhow::Result;
use clap::Parser;
use meetwrap::cli::{
    handle_analyze_command, handle_config_command, handle_health_command, Cli, CliCommand,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        CliCommand::Version => {
            println!("MeetWrap {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliCommand::Analyze(args) => handle_analyze_command(args).await,
        CliCommand::Health(args) => handle_health_command(args).await,
        CliCommand::Config => handle_config_command(),
    }
}
