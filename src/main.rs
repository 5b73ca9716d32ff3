use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use craft_gallery::database::backfill::{backfill_counts, progress_bar};
use craft_gallery::utils::config::{
    ServerConfig, StoreConfig, DEFAULT_BIND, DEFAULT_BLOB_DIR, DEFAULT_DB_PATH,
    DEFAULT_PUBLIC_BASE_URL,
};
use craft_gallery::{build_router, AppState, Store};

#[derive(Parser, Debug)]
#[command(author, version, about = "School arts & crafts gallery service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        #[arg(long, env = "GALLERY_BIND", default_value = DEFAULT_BIND)]
        bind: String,

        #[arg(long, env = "GALLERY_DB", default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        #[arg(long, env = "GALLERY_BLOB_DIR", default_value = DEFAULT_BLOB_DIR)]
        blob_dir: PathBuf,

        #[arg(long, env = "NEXT_PUBLIC_BASE_URL", default_value = DEFAULT_PUBLIC_BASE_URL)]
        public_base_url: String,

        #[arg(long, env = "GALLERY_MAX_CONNECTIONS", default_value_t = 8)]
        max_connections: usize,
    },
    /// Set NULL counters to 0; with --recount rebuild them from interaction rows.
    BackfillCounts {
        #[arg(long, env = "GALLERY_DB", default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        #[arg(long)]
        recount: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    match args.command {
        Command::Serve {
            bind,
            db,
            blob_dir,
            public_base_url,
            max_connections,
        } => {
            let config = ServerConfig::new(&bind, db, blob_dir, &public_base_url, max_connections)?;
            serve(config).await
        }
        Command::BackfillCounts { db, recount } => backfill(db, recount).await,
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    let store = Store::open(&config.store)
        .await
        .with_context(|| format!("failed to open database {}", config.store.db_path.display()))?;
    let bind_addr = config.bind_addr;
    let state = AppState::new(store, config);
    info!(
        blob_dir = %state.blobs.root().display(),
        public_base_url = %state.config.public_base_url,
        "Gallery service starting"
    );

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("Gallery service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutdown requested");
}

async fn backfill(db: PathBuf, recount: bool) -> Result<()> {
    let cfg = StoreConfig {
        db_path: db,
        ..StoreConfig::default()
    };
    let store = Store::open(&cfg)
        .await
        .with_context(|| format!("failed to open database {}", cfg.db_path.display()))?;

    let pb = progress_bar();
    let bar = pb.clone();
    let report = store
        .call(move |conn| backfill_counts(conn, recount, Some(&bar)))
        .await
        .context("counter backfill failed")?;
    pb.finish_and_clear();

    info!(
        "Backfill complete: {} artworks had NULL counters, {} recounted",
        report.nulls_filled, report.recounted
    );
    Ok(())
}
