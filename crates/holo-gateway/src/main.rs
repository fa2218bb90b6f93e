//! HoloStorage Accessor - REST gateway over a FHIR backend and an object store

use clap::Parser;
use holo_gateway::{run_server_with_shutdown, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "holo-accessor")]
#[command(about = "REST gateway for hologram, patient and author metadata")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "HOLO_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long, env = "HOLO_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "HOLO_PORT")]
    port: Option<u16>,

    /// FHIR backend base URL
    #[arg(long, env = "HOLO_FHIR_URL")]
    fhir_url: Option<String>,

    /// Object store endpoint
    #[arg(long, env = "HOLO_BLOB_ENDPOINT")]
    blob_endpoint: Option<String>,

    /// Object store container for hologram binaries
    #[arg(long, env = "HOLO_BLOB_CONTAINER")]
    blob_container: Option<String>,

    /// Object store access token
    #[arg(long, env = "HOLO_BLOB_ACCESS_TOKEN")]
    blob_token: Option<String>,

    /// Cap on bundle pages followed per id
    #[arg(long, env = "HOLO_MAX_PAGINATION_ROUNDS")]
    max_pagination_rounds: Option<usize>,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long, env = "HOLO_MEMORY_STORE")]
    memory_store: bool,

    /// Enable debug logging
    #[arg(short, long, env = "HOLO_DEBUG")]
    debug: bool,
}

impl Args {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(fhir_url) = self.fhir_url {
            config.fhir_url = fhir_url;
        }
        if self.blob_endpoint.is_some() {
            config.blob_endpoint = self.blob_endpoint;
        }
        if let Some(container) = self.blob_container {
            config.blob_container = container;
        }
        if self.blob_token.is_some() {
            config.blob_access_token = self.blob_token;
        }
        if self.max_pagination_rounds.is_some() {
            config.max_pagination_rounds = self.max_pagination_rounds;
        }
        config.use_memory_store |= self.memory_store;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("holo_gateway={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build configuration
    let mut config = GatewayConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    tracing::info!("Starting HoloStorage Accessor on {}", config.bind_addr());
    tracing::info!("FHIR backend: {}", config.fhir_url);

    if config.use_memory_store {
        tracing::warn!("Using in-memory storage - holograms will NOT persist!");
    }

    // Run the server
    run_server_with_shutdown(config, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
    })
    .await
}
