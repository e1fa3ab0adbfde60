use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

mod config;
mod dataset;
mod error;
mod evaluation;
mod models;
mod output;
mod presenter;
mod render;
mod runner;
mod server;
mod session;
#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::runner::Runner;
use crate::server::{AppState, build_router};

/// Image Edit Annotator - Collect anonymous best/worst judgments of image-editing model outputs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    config_file: PathBuf,

    /// Listen address, overriding `bind_addr` from the config
    #[arg(short, long)]
    bind: Option<String>,

    /// Verbose output - log every session event
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let mut config = Config::from_file(&args.config_file)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let dataset = Dataset::from_file(&config.dataset_path)?;
    dataset
        .check_indices(&config.eval_indices)
        .with_context(|| format!("Dataset {} does not cover the evaluation list", config.dataset_path.display()))?;
    info!(
        "Loaded {} samples from {}; evaluating {} with {} models",
        dataset.len(),
        config.dataset_path.display(),
        config.eval_indices.len(),
        config.models.len()
    );
    info!("Results will be written to {}", config.results_dir.display());

    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(Runner::new(config, dataset)));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
