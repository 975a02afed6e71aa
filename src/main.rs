use clap::Parser;
use env_logger::Env;
use imageledger_indexer::config::IndexerConfig;
use imageledger_indexer::db;
use imageledger_indexer::search::{ReindexOptions, SearchService, reindex_images};

#[derive(Parser, Debug)]
#[command(
    name = "reindex",
    about = "Rebuild the image search index from the primary database"
)]
struct Args {
    /// Be very chatty and run logging at DEBUG.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Err(err) = run().await {
        log::error!("reindex failed: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = IndexerConfig::from_env()?;
    log::info!("connecting to search engine at {}", config.search_url);

    let pool = db::connect(&config.database_url).await?;
    let search = SearchService::new(&config.search_url);

    let options = ReindexOptions {
        chunk_size: config.chunk_size as i64,
        flush_threshold: config.flush_threshold,
        // Full reindex is the high-volume path; tags are filled in by a
        // later enrichment pass.
        defer_tags: true,
    };

    let summary = reindex_images(&pool, &search, &options).await?;
    log::info!(
        "reindex complete: {} indexed, {} rejected, {} skipped",
        summary.indexed,
        summary.failed,
        summary.skipped
    );

    Ok(())
}
