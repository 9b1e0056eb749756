use anyhow::{bail, Result};

use crate::config::Config;
use crate::jobs::JobsClient;
use crate::lifecycle::LifecycleClient;
use crate::presentation::terminal::ResultsView;
use crate::presentation::TerminalSurface;

pub mod analyze;
pub mod args;

pub use analyze::handle_analyze_command;
pub use args::{AnalyzeCliArgs, Cli, CliCommand, HealthCliArgs};

pub async fn handle_health_command(args: HealthCliArgs) -> Result<()> {
    let config = Config::load()?;
    let base_url = args.api_url.unwrap_or(config.api.base_url);

    let client = LifecycleClient::new(
        Box::new(JobsClient::new(&base_url)),
        Box::new(TerminalSurface::new(false, ResultsView::All)?),
        config.polling.interval(),
    );

    if !client.check_health().await {
        bail!("Backend at {} is not healthy", base_url);
    }

    Ok(())
}

pub fn handle_config_command() -> Result<()> {
    let config = Config::load()?;
    println!("# {}", Config::config_path()?.display());
    println!("{}", config.to_toml()?);
    Ok(())
}
