//! leadhunt-vet - Opportunity Vetting Service
//!
//! Receives candidate documents from the upstream collector, extracts a
//! structured analysis via the generative model, verifies it through two
//! parallel branches (external fact check, internal QC), joins the results,
//! and decides each lead: approve, reject, or park for manual review.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use leadhunt_common::events::EventBus;
use leadhunt_vet::config::VetConfig;
use leadhunt_vet::services::Collaborators;
use leadhunt_vet::AppState;

#[derive(Parser, Debug)]
#[command(name = "leadhunt-vet", about = "Business opportunity vetting service")]
struct Args {
    /// Root folder for the database and working files
    #[arg(long)]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting leadhunt-vet (Opportunity Vetting) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = VetConfig::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    // Resolve and prepare the root folder
    let root_folder =
        leadhunt_common::config::resolve_root_folder(args.root_folder.as_deref(), "LEADHUNT_ROOT")
            .map_err(|e| anyhow::anyhow!("Failed to resolve root folder: {}", e))?;
    leadhunt_common::config::ensure_root_folder(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    let db_path = root_folder.join("leadhunt.db");
    info!("Database: {}", db_path.display());
    let db_pool = leadhunt_vet::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let collaborators = Collaborators::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build collaborators: {}", e))?;

    let event_bus = EventBus::new(100);
    let state = AppState::new(db_pool, &config, collaborators, event_bus);

    // Periodic join-timeout sweep and dedup purge
    state.pipeline.spawn_sweeper();
    info!(
        "Join sweeper running (deadline {}s, interval {}s)",
        config.join.deadline_secs, config.join.sweep_interval_secs
    );

    let app = leadhunt_vet::build_router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
