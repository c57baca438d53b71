use anyhow::Result;
use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

use super::args::{Cli, Commands};
use super::handlers;

pub fn run(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Run(args) => handlers::run::handle(cli.config, args),
        Commands::Check { kb } => handlers::check::handle(cli.config, kb),
    }
}
