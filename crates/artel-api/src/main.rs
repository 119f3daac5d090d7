mod error;
mod routes;
mod server;
mod state;
mod telemetry;

use artel_core::ServiceConfig;
use artel_ingest::IngestionPipeline;
use artel_storage::create_storage;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    // Load configuration
    let config = ServiceConfig::from_env()?;

    // Wire storage and the ingestion pipeline
    let storage = create_storage(&config).await?;
    let pipeline = Arc::new(IngestionPipeline::new(storage, config.limits));
    let app = routes::router(state::AppState { pipeline });

    // Start the server
    server::start_server(&config, app).await?;

    Ok(())
}
