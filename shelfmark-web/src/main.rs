//! shelfmark-web - Catalog Management Service
//!
//! Stores bibliographic records keyed by accession number, serves the
//! browse/search/edit API, and runs the spreadsheet import reconciliation
//! workflow (classify, stage, resolve).

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfmark_web::AppState;

/// Command-line arguments for shelfmark-web
#[derive(Parser, Debug)]
#[command(name = "shelfmark-web")]
#[command(about = "Catalog management service with spreadsheet import reconciliation")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5800", env = "SHELFMARK_PORT")]
    port: u16,

    /// Root folder holding the catalog database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfmark_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting shelfmark-web");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve root folder: CLI arg, env var, config file, then OS default
    let root_folder = shelfmark_common::config::resolve_root_folder(args.root_folder.as_deref());
    shelfmark_common::config::ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = shelfmark_common::config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let db_pool = shelfmark_web::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let state = AppState::new(db_pool);
    let app = shelfmark_web::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("Listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
