use std::sync::Arc;

use filmclub_api::{
    api::{create_router, AppState},
    config::{Config, StorageBackend},
    db::{create_pool, run_migrations, MemoryStore, PgStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let state = match config.storage {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            AppState::new(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.database_max_connections).await?;
            if config.run_migrations {
                run_migrations(&pool).await?;
                tracing::info!("Database migrations applied");
            }
            tracing::info!("Using PostgreSQL storage");
            AppState::new(Arc::new(PgStore::new(pool)))
        }
    };

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
