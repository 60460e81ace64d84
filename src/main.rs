use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use vision_ensemble::{AppError, Configuration, JsonFileStore, UsageTracker};

/// Prints usage counters and remaining quota for each analysis provider.
#[derive(Parser, Debug)]
#[command(name = "vision-usage", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Zero all usage counters before reporting
    Reset,
}

fn init_logging(configuration: &Configuration) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_max_level(configuration.log_level()?)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let configuration = Configuration::load()?;
    init_logging(&configuration)?;

    let store = Arc::new(JsonFileStore::new(&configuration.store_path));
    info!("Using usage store at {}", store.path().display());
    let tracker = UsageTracker::new(store);

    if let Some(Command::Reset) = cli.command {
        tracker.reset_all().await;
        info!("Usage counters reset");
    }

    let stats = tracker.get_stats().await;
    let quota = tracker.quota_report(&configuration).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "stats": stats, "quota": quota.services }))?
    );
    Ok(())
}
