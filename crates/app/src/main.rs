use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "claimsheets={level},server={level},engine={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let db = connect(&server.database_url()).await?;
    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tokio::select! {
        result = server::run_with_listener(engine, db, listener, server.cors_origin) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn connect(
    url: &str,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("opening database {url}");

    let database = sea_orm::Database::connect(connect_options(url)).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

/// An in-memory database lives as long as its connection, so the pool must
/// never recycle it.
const MEMORY_KEEP_ALIVE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn connect_options(url: &str) -> ConnectOptions {
    // SQLite has a single writer: queue transactions on the pool instead of
    // failing them with SQLITE_BUSY.
    let mut options = ConnectOptions::new(url);
    options.max_connections(1).sqlx_logging(false);
    if url.contains(":memory:") {
        options
            .idle_timeout(MEMORY_KEEP_ALIVE)
            .max_lifetime(MEMORY_KEEP_ALIVE);
    }
    options
}
