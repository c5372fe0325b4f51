use beachline_api::config::{ServerConfig, load_store};
use beachline_api::{AppState, create_app};
use beachline_core::store::StationStore;
use beachline_engine::Engine;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let config = ServerConfig::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .pretty()
        .init();

    // Load stations, initial readings and the calendar
    let store = load_store(&config.seed, chrono::Utc::now()).await?;
    tracing::info!(
        "Loaded {} stations from {}",
        store.list_stations()?.len(),
        config.seed.display()
    );

    // Create application state
    let app_state = AppState::new(Engine::new(Box::new(store)));

    // Build our application with routes
    let app = create_app(app_state);

    let bind_addr = config.bind_addr();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind_addr, e))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
