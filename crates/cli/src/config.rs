use clap::ValueEnum;
use client::ClientConfig;
use importer::ImportOptions;
use serde::{Deserialize, Serialize};

use crate::args::Args;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub import: ImportOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `importer=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Layer command-line flags over `base` (usually `ClientConfig::from_env()`)
    pub fn from_args(args: &Args, base: ClientConfig) -> Self {
        let mut client = base;
        if let Some(url) = &args.api_url {
            client.api_url = url.clone();
        }
        if let Some(key) = &args.api_key {
            client.api_key = Some(key.clone());
        }
        if let Some(secs) = args.timeout_secs {
            client.timeout_secs = secs;
        }

        let mut import = ImportOptions {
            missing_bounds: args.missing_bounds,
            ..ImportOptions::default()
        };
        if let Some(dir) = &args.scratch_dir {
            import.scratch_root = dir.clone();
        }

        Self {
            client,
            import,
            logging: LoggingConfig {
                format: args.log_format,
                level: args.log_level.clone(),
            },
        }
    }
}
