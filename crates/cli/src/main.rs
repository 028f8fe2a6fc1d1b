mod args;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use client::{ApiClient, ClientConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Args;
use config::{AppConfig, LogFormat, LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::from_args(&args, ClientConfig::from_env());

    init_tracing(&config.logging)?;

    let api = ApiClient::new(&config.client).context("Failed to build API client")?;
    let project = api.project(args.project.as_str());

    // Fail early on a bad key or unknown project, before unpacking anything
    if !args.skip_preflight {
        project
            .info()
            .await
            .with_context(|| format!("Project '{}' is not reachable", args.project))?;
    }

    info!(
        archive = %args.archive.display(),
        project = %args.project,
        api = %api.base_url(),
        "starting import"
    );

    let report = importer::import_bundle(&args.archive, project, config.import.clone())
        .await
        .with_context(|| format!("Failed to import {}", args.archive.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Logs go to stderr so stdout only carries the report
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid log level '{}'", logging.level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
