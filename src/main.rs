use anyhow::{Context, Result};
use clap::Parser;
use lilnas_core::config::Settings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lilnas-watch", author, version)]
#[command(about = "Watch a path and log every change to it")]
struct Cli {
    /// Path to watch (overrides `watch.path` from the settings)
    path: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(short, long, env = "LILNAS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load settings")?;

    lilnas_core::logging::init_with_config(&settings.logging);

    let path = cli
        .path
        .or(settings.watch.path)
        .context("no path to watch: pass one or set watch.path")?;

    println!("watching {}", path.display());

    let report = lilnas_core::run(&path)
        .await
        .with_context(|| format!("watching {}", path.display()))?;

    tracing::debug!("[main] run finished: {report:?}");
    Ok(())
}
