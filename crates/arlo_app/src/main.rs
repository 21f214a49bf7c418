use std::io;

use anyhow::Context;
use arlo_app::cli::Cli;
use arlo_app::commands;
use arlo_app::config::AppConfig;
use arlo_logging::arlo_info;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let config = cli.apply(config);
    arlo_logging::initialize(config.log_destination.into(), config.level()?);
    arlo_info!("arlo {} against {}", env!("CARGO_PKG_VERSION"), config.base_url);

    let mut stdout = io::stdout().lock();
    commands::run(&cli.command, &config, cli.route.as_deref(), &mut stdout)
}
