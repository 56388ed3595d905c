//! Multi Timer - several named countdown timers behind a local HTTP API
//!
//! This is the main entry point for the multi-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use multi_timer::{
    alerts::{AlertScheduler, InMemoryScheduler, LocalAlertScheduler},
    api::create_router,
    config::Config,
    state::{AppState, TimerStore},
    tasks::expiry_watch_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("multi_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting multi-timer server v{}", env!("CARGO_PKG_VERSION"));

    let file = config.timer_file()?;
    info!("Timers are saved to {}", file.path().display());

    let alerts: Arc<dyn AlertScheduler> = if config.no_alerts {
        info!("Alerts disabled");
        Arc::new(InMemoryScheduler::new())
    } else {
        Arc::new(LocalAlertScheduler::new(config.alert_command.clone()))
    };

    // Load saved timers; running ones get their alerts back
    let store = TimerStore::open(file, alerts);
    let state = Arc::new(AppState::new(store, config.port, config.host.clone()));

    // Start the expiry watch background task
    let watch_state = Arc::clone(&state);
    tokio::spawn(async move {
        expiry_watch_task(watch_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers             - List timers");
    info!("  POST   /timers             - Create a timer");
    info!("  GET    /timers/:id         - Show one timer");
    info!("  DELETE /timers/:id         - Delete a timer");
    info!("  POST   /timers/:id/start   - Start or resume");
    info!("  POST   /timers/:id/pause   - Pause");
    info!("  POST   /timers/:id/stop    - Stop and reset");
    info!("  POST   /timers/reorder     - Move a timer");
    info!("  GET    /events             - Server-sent store events");
    info!("  GET    /status             - Summary and uptime");
    info!("  GET    /health             - Health check");

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

    if let Err(e) = state.with_store(|store| store.persist()) {
        tracing::error!("Failed to save timers on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
