use journal_core::clock::SystemClock;
use journal_server::{
    app,
    config::Config,
    db::{JournalRepo, init_database},
    handlers::AppState,
};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting Journal API v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {:?}", config.database_path);
    info!("CORS origins: {:?}", config.cors_origins);

    let conn = match open_database(&config.database_path) {
        Ok(conn) => conn,
        Err(e) => {
            error!("Database {:?} unusable: {}", config.database_path, e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(JournalRepo::new(conn));
    let state = AppState {
        repo: repo.clone(),
        clock: Arc::new(SystemClock),
        session_expiry_days: config.session_expiry_days,
    };
    let router = app(state, &config);

    // Create listener
    let addr = config.server_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", addr);

    spawn_session_cleanup(repo);

    // Run server with graceful shutdown
    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shut down gracefully");
}

fn open_database(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    init_database(&conn)?;
    Ok(conn)
}

/// Drop expired sessions once an hour.
fn spawn_session_cleanup(repo: Arc<JournalRepo>) {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            ticks.tick().await;
            match repo.cleanup_expired_sessions() {
                Ok(0) => {}
                Ok(removed) => info!("Removed {} expired session(s)", removed),
                Err(e) => warn!("Expired session cleanup failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
