use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hondana::{EventSink, ReaderService};
use hondana_storage::Storage;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the progress maintenance passes (consolidate, cap, cleanup)
    Maintenance,
    /// Print the chapter a user should resume a series at
    ContinuePoint {
        #[arg(long)]
        series_id: i64,
        #[arg(long)]
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hondana=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let storage = Storage::new(&args.data_dir).await?;

    match args.command {
        Command::Maintenance => {
            let removed = storage.consolidate_progress().await?;
            let clamped = storage.ensure_chapter_progress_is_capped().await?;
            storage.cleanup_db_entries().await?;
            tracing::info!(
                "Maintenance done: {} duplicates removed, {} rows re-clamped",
                removed,
                clamped
            );
        }
        Command::ContinuePoint { series_id, user_id } => {
            let reader = ReaderService::new(storage, EventSink::default());
            let chapter = reader.get_continue_point(series_id, user_id).await?;
            println!("{}", serde_json::to_string_pretty(&chapter)?);
        }
    }

    Ok(())
}
