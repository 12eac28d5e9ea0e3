use anyhow::Result;
use clap::Parser;
use portlens::cli::{Cli, Commands};
use portlens::config::AppSettings;
use portlens::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => AppSettings::load_from(path)?,
        None => AppSettings::load()?,
    };

    match &cli.command {
        Commands::Scan(cmd) => cmd.execute(&settings, cli.verbose, cli.quiet).await?,
        Commands::Presets(cmd) => cmd.execute(cli.quiet)?,
    }
    Ok(())
}
