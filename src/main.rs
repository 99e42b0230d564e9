use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use iptrail::config::{Config, DatabaseBackend};
use iptrail::lookup::{IpApiClient, LookupService};
use iptrail::storage::{HistoryStore, PostgresStorage, SqliteStorage};
use iptrail::web::{self, templates::load_templates, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage: Arc<dyn HistoryStore> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage");
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let geo = Arc::new(
        IpApiClient::from_config(&config.geolocation)
            .context("failed to create geolocation client")?,
    );
    info!(
        "🌍 Geolocation provider: {} (timeout {}s)",
        config.geolocation.base_url, config.geolocation.timeout_secs
    );

    let templates = load_templates().context("failed to load templates")?;
    let lookups = LookupService::new(Arc::clone(&storage), geo);
    let app = web::create_router(Arc::new(AppState::new(lookups, templates)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    storage.close().await;
    info!("Database connections closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install signal handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
