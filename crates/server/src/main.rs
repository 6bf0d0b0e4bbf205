use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_core::{
    load_config, load_default_config, validate_config, Config, LogFormat, SqliteTicketStore,
    StorageEngine, TicketStore,
};
use helpdesk_server::{api::create_router, state::AppState};

/// Environment variable naming the config file
const CONFIG_ENV: &str = "HELPDESK_CONFIG";

/// Config file used when `HELPDESK_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // The subscriber may not be up yet, so stderr gets it too.
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = load()?;

    // Initialize logging
    init_tracing(config.logging.format);

    // Validate configuration
    validate_config(&config).context("Invalid configuration")?;

    info!("Configuration loaded successfully");

    // Open storage and create the schema if needed
    let engine = StorageEngine::open_with_timeout(
        &config.database.path,
        Duration::from_millis(config.database.busy_timeout_ms),
    )
    .with_context(|| format!("Failed to open database at {:?}", config.database.path))?;

    if let Some(path) = engine.path() {
        info!("Database file: {}", path.display());
    }

    let ticket_store: Arc<dyn TicketStore> = Arc::new(SqliteTicketStore::new(Arc::new(engine)));
    info!("Ticket store initialized");

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), ticket_store));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Load the config file named by `HELPDESK_CONFIG`, falling back to
/// `config.toml` and then to built-in defaults.
///
/// An explicitly named file must exist.
fn load() -> Result<Config> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                load_default_config().context("Failed to load default config")
            }
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
