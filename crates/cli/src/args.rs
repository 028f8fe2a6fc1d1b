use clap::Parser;
use importer::MissingBoundsPolicy;
use std::path::PathBuf;

use crate::config::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "bundle-import")]
#[command(about = "Replay the sources of an export bundle into an annotation project")]
#[command(version)]
pub struct Args {
    /// Export bundle (.zip or .tar)
    pub archive: PathBuf,

    /// Target project id or name
    #[arg(short, long)]
    pub project: String,

    /// API base URL [env: ANNOTATION_API_URL]
    #[arg(long)]
    pub api_url: Option<String>,

    /// API key [env: ANNOTATION_API_KEY]
    #[arg(long)]
    pub api_key: Option<String>,

    /// Request timeout in seconds [env: ANNOTATION_API_TIMEOUT_SECS]
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// PDF sources without text bounds: degrade, skip or fail
    #[arg(long, default_value_t = MissingBoundsPolicy::Degrade)]
    pub missing_bounds: MissingBoundsPolicy,

    /// Where to unpack the bundle (defaults to the system temp dir)
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Do not check that the project exists before importing
    #[arg(long)]
    pub skip_preflight: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
