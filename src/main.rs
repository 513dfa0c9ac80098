//! Timekeeper - A speech timer server
//!
//! This is the main entry point for the timekeeper application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use timekeeper::{
    api::create_router,
    clock::SystemClock,
    config::Config,
    scheduler::WatchScheduler,
    services::{JsonFilePresetStore, PresetStore},
    state::{AppState, TimerSession},
    tasks::ticker_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timekeeper={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timekeeper server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, presets={}, tick={}ms",
          config.host, config.port, config.presets.display(), config.tick_ms);

    // Seed the standard speech presets on first run
    let presets = Arc::new(JsonFilePresetStore::new(&config.presets));
    if let Err(e) = presets.ensure_defaults() {
        warn!("Failed to create default presets: {}", e);
    }
    info!("{} presets available", presets.list_configs().len());

    // Create the timer session and application state
    let (scheduler, ticks) = WatchScheduler::channel();
    let session = TimerSession::new(Arc::new(SystemClock), Box::new(scheduler));
    let state = Arc::new(AppState::new(
        session,
        presets,
        config.tick_interval(),
        config.port,
        config.host.clone(),
    ));

    // Start the tick background task
    tokio::spawn(ticker_task(Arc::clone(&state), ticks));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /start        - Start or resume the timer");
    info!("  POST   /pause        - Pause the timer");
    info!("  POST   /reset        - Reset the timer");
    info!("  PUT    /config       - Apply a threshold configuration");
    info!("  PUT    /config/:id   - Apply a saved preset");
    info!("  GET    /presets      - List saved presets");
    info!("  POST   /presets      - Save a preset");
    info!("  GET    /presets/:id  - Fetch a preset");
    info!("  DELETE /presets/:id  - Delete a preset");
    info!("  GET    /events       - Server-sent signal changes");
    info!("  GET    /status       - Current timer status");
    info!("  GET    /health       - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
