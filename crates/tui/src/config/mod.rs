use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/billdesk.toml";
const ENV_PREFIX: &str = "BILLDESK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Bearer token; only read from the config file or `BILLDESK_TOKEN`.
    pub token: Option<String>,
    pub page_size: u32,
    pub poll_interval_secs: u64,
    pub timezone: String,
    pub log_file: PathBuf,
    pub log_level: String,
    /// Screen opened at start, e.g. `/csv-jobs`.
    pub route: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            token: None,
            page_size: engine::query::DEFAULT_PAGE_SIZE,
            poll_interval_secs: 10,
            timezone: "Africa/Lagos".to_string(),
            log_file: PathBuf::from("billdesk.log"),
            log_level: "info".to_string(),
            route: None,
        }
    }
}

#[derive(Debug, Default, Parser)]
#[command(name = "billdesk", about = "Billing back-office console")]
pub struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the API base URL (e.g. https://billing.example.com/api).
    #[arg(long)]
    base_url: Option<String>,
    /// Open a screen directly, e.g. /csv-jobs or /service-stations/add.
    #[arg(long)]
    route: Option<String>,
    /// Rows per page.
    #[arg(long)]
    page_size: Option<u32>,
    /// Seconds between refreshes on polling screens.
    #[arg(long)]
    poll_interval: Option<u64>,
    /// Log level for the log file (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    load_from(Args::parse())
}

/// Defaults, then the TOML file, then `BILLDESK_*` variables, then flags.
pub fn load_from(args: Args) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(route) = args.route {
        settings.route = Some(route);
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
    if let Some(poll_interval) = args.poll_interval {
        settings.poll_interval_secs = poll_interval;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if settings.page_size == 0 {
        settings.page_size = engine::query::DEFAULT_PAGE_SIZE;
    }
    settings.poll_interval_secs = settings.poll_interval_secs.max(1);

    Ok(settings)
}
