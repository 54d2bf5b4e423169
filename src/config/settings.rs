use crate::error::{ArchiveError, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command line surface; every flag can also come from the environment
#[derive(Debug, Clone, Parser)]
#[command(name = "slack-archive", version, about)]
pub struct Cli {
    /// Unzipped location of the Slack export
    #[arg(long = "in", env = "SLACK_ARCHIVE_IN", default_value = ".")]
    pub input_dir: PathBuf,

    /// Directory where to write output files
    #[arg(long = "out", env = "SLACK_ARCHIVE_OUT", default_value = ".")]
    pub output_dir: PathBuf,

    /// Title shown on every page
    #[arg(long, env = "SLACK_ARCHIVE_TITLE", default_value = "")]
    pub title: String,

    /// Bearer token used when downloading private file urls
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, env = "SLACK_ARCHIVE_FETCH_TIMEOUT_SECS", default_value_t = 60)]
    pub fetch_timeout_secs: u64,

    /// Number of channel pages rendered at the same time
    #[arg(long, env = "SLACK_ARCHIVE_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// Emit logs as JSON lines
    #[arg(long, env = "SLACK_ARCHIVE_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub export: ExportConfig,
    pub fetch: FetchConfig,
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub title: String,
    pub concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            token: None,
            timeout: Duration::from_secs(60),
        }
    }
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    Settings::from_cli(Cli::parse())
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if !cli.input_dir.is_dir() {
            return Err(ArchiveError::Config(format!(
                "input directory {:?} does not exist",
                cli.input_dir
            )));
        }
        if cli.concurrency == 0 {
            return Err(ArchiveError::Config(
                "Invalid SLACK_ARCHIVE_CONCURRENCY: must be at least 1".to_string(),
            ));
        }
        if cli.fetch_timeout_secs == 0 {
            return Err(ArchiveError::Config(
                "Invalid SLACK_ARCHIVE_FETCH_TIMEOUT_SECS: must be at least 1".to_string(),
            ));
        }

        let export = ExportConfig {
            input_dir: cli.input_dir,
            output_dir: cli.output_dir,
            title: cli.title,
            concurrency: cli.concurrency,
        };

        let fetch = FetchConfig {
            token: cli.token.filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(cli.fetch_timeout_secs),
        };

        Ok(Settings {
            export,
            fetch,
            log_json: cli.log_json,
        })
    }
}
