//! BookOpt CLI: upload booking problems and wait for the optimizer's results.
//!
//! Reads `bookopt.toml` when present (or the file given with `--config`);
//! any setting can be overridden with `BOOKOPT_` environment variables.

mod files;
mod presenter;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use bookopt_core::{
    load_config, load_config_from_env, validate_config, Config, HttpBackend, UploadOrchestrator,
};

use presenter::TerminalPresenter;

const DEFAULT_CONFIG: &str = "bookopt.toml";

#[derive(Parser)]
#[command(name = "bookopt", version, about = "BookOpt upload client")]
struct Cli {
    /// Configuration file (defaults to ./bookopt.toml when it exists)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload JSON files and wait until their results are ready
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Post a JSON document to the echo endpoint
    Echo {
        /// JSON payload, e.g. '{"hello": "world"}'
        payload: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None if Path::new(DEFAULT_CONFIG).exists() => load_config(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load config from {:?}", DEFAULT_CONFIG))?,
        None => load_config_from_env().context("Failed to load config from environment")?,
    };
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

/// Returns whether every file reached a ready result.
async fn upload(config: &Config, paths: &[PathBuf]) -> Result<bool> {
    let candidates = files::read_candidates(paths).await?;
    let total = candidates.len();

    let backend = HttpBackend::new(&config.api).context("Failed to create HTTP client")?;
    debug!(base_url = backend.base_url(), files = total, "Submitting batch");

    let orchestrator = UploadOrchestrator::from_config(
        config,
        Arc::new(backend),
        Arc::new(TerminalPresenter::stdout()),
    );

    let handle = match orchestrator.submit(candidates) {
        Ok(handle) => handle,
        // Already rendered by the presenter.
        Err(_) => return Ok(false),
    };
    let reports = handle.join().await;

    let ready = reports.iter().filter(|r| r.is_ready()).count();
    println!("{} of {} files ready.", ready, total);
    Ok(ready == total)
}

async fn echo(config: &Config, payload: &str) -> Result<bool> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("Payload is not valid JSON")?;
    let backend = HttpBackend::new(&config.api).context("Failed to create HTTP client")?;

    let reply = backend.echo(&payload).await.context("Echo request failed")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&reply).context("Serialize response")?
    );
    Ok(true)
}

async fn run(cli: Cli) -> Result<bool> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Upload { files } => upload(&config, &files).await,
        Commands::Echo { payload } => echo(&config, &payload).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
