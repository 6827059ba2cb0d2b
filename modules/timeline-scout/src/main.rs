use std::path::PathBuf;

use anyhow::{Context, Result};
use browser_client::BrowserSession;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timeline_scout::navigator::normalize_username;
use timeline_scout::output::write_posts;
use timeline_scout::{Credentials, Scout, ScoutConfig};

#[derive(Parser)]
#[command(
    name = "timeline-scout",
    about = "Collect the most recent posts from a profile timeline"
)]
struct Cli {
    /// Profile to scrape, with or without the leading @
    username: String,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of posts to collect (overrides target_count)
    #[arg(long)]
    count: Option<usize>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("timeline_scout=info,browser_client=info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Exits with a usage error before anything else happens.
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let username = normalize_username(&cli.username)?;

    let mut config = ScoutConfig::load(cli.config.as_deref())?;
    if let Some(count) = cli.count {
        config.target_count = count;
    }
    if cli.headless {
        config.headless = true;
    }
    config.validate()?;
    config.log_summary();

    let credentials = Credentials::from_env();
    credentials.log_presence();

    let session = BrowserSession::launch(&config.launch_options())
        .await
        .context("Failed to launch browser")?;

    let output_dir = config.output_dir.clone();
    let scout = Scout::new(config, credentials);
    let report = match scout.run(session, &username).await {
        Ok(report) => report,
        Err(e) => {
            error!(username = %username, error = %e, "Scrape failed");
            return Err(e.into());
        }
    };
    info!("{report}");

    let path = write_posts(&output_dir, &username, &report.posts)?;
    info!(path = %path.display(), "Done");
    Ok(())
}
