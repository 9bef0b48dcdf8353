use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use contour_engine::lookup::{LookupConfig, SystemLookup};
use contour_engine::{ConversationEngine, EngineConfig};
use contour_llm::{AnthropicGateway, ReliableGateway};
use contour_server::{AppState, ServerConfig};
use contour_store::Database;
use contour_telemetry::LogFormat;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

#[derive(Parser, Debug)]
#[command(name = "contour", about = "Enterprise contour interview server")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// SQLite database path.
    #[arg(long, default_value = "contour.db")]
    database: PathBuf,

    /// Model identifier for the chat gateway.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    contour_telemetry::init(LogFormat::from_env());

    let args = Args::parse();

    let db = Database::open(&args.database).context("open database")?;

    let api_key =
        std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY must be set")?;
    let gateway = ReliableGateway::with_defaults(AnthropicGateway::new(api_key, args.model.clone()));

    let lookup = lookup_from_env();
    if lookup.is_none() {
        tracing::info!("system data lookups not configured, live context disabled");
    }

    let engine = Arc::new(ConversationEngine::new(
        Arc::new(gateway),
        db.clone(),
        lookup,
        EngineConfig::default(),
    ));

    let config = ServerConfig { port: args.port };
    let handle = contour_server::start(config, AppState { engine, db })
        .await
        .context("start server")?;

    tracing::info!(port = handle.port, model = %args.model, "contour server ready");

    tokio::signal::ctrl_c().await.context("listen for ctrl+c")?;
    tracing::info!("shutting down");

    Ok(())
}

/// Discovery-service endpoints are optional; all three must be configured
/// for lookups to be enabled.
fn lookup_from_env() -> Option<Arc<SystemLookup>> {
    let asset = std::env::var("ASSET_API_URL").ok()?;
    let topology = std::env::var("TOPOLOGY_API_URL").ok()?;
    let graph = std::env::var("GRAPH_API_URL").ok()?;
    let api_key = std::env::var("DISCOVERY_API_KEY").unwrap_or_default();

    Some(Arc::new(SystemLookup::new(LookupConfig::new(
        asset, topology, graph, api_key,
    ))))
}
