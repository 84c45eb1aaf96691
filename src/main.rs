use anyhow::{Context, Result};
use clap::Parser;
use dailyknowledge::api::ApiClient;
use dailyknowledge::app::App;
use dailyknowledge::config::Config;
use dailyknowledge::feed::TimeRange;
use dailyknowledge::ui;
use std::path::PathBuf;

/// Default config path (~/.config/dailyknowledge/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("dailyknowledge")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "dailyknowledge",
    version,
    about = "Terminal reader for the dailyKnowledge article feed"
)]
struct Args {
    /// Base URL of the collection service API (overrides config)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Initial time range: today, yesterday, 3days or week (overrides config)
    #[arg(long, value_name = "RANGE")]
    range: Option<TimeRange>,

    /// Category to open first (defaults to the first one the API lists)
    #[arg(long, value_name = "NAME")]
    category: Option<String>,

    /// Config file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; the TUI owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    if let Some(range) = args.range {
        config.default_range = range;
    }

    let client = ApiClient::new(&config.api_base_url, config.request_timeout())
        .context("Failed to create API client")?;
    tracing::info!(api = %client.base_url(), range = %config.default_range, "Starting");

    let mut app = App::new(client, &config, args.category);
    ui::run(&mut app).await?;

    Ok(())
}
