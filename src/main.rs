use std::sync::Arc;

use commission_pricing::{
    config::{AppConfig, StorageBackend},
    create_router, db,
    repository::{MemoryStore, PostgresStore, Repositories},
    AppState, PricingSettings,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Commission Pricing API - Starting...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let repos = match build_repositories(&config).await {
        Ok(repos) => repos,
        Err(e) => {
            tracing::error!("Failed to initialise storage: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(repos, PricingSettings::from(&config));

    // Expired rate entries are swept by a task owned by the process
    let _sweeper = state.cache.spawn_sweeper(config.rate_cache_sweep_interval);

    let app = create_router(state);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Commission Pricing API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn build_repositories(config: &AppConfig) -> Result<Repositories, Box<dyn std::error::Error>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL must be set for the postgres backend")?;

            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url, config.db_max_connections).await?;
            db::run_migrations(&pool).await?;
            Ok(Repositories::postgres(PostgresStore::new(pool)))
        }
        StorageBackend::Memory => {
            let store = match config.seed_file {
                Some(ref path) => {
                    tracing::info!("Loading seed data from {}", path);
                    let json = tokio::fs::read_to_string(path).await?;
                    MemoryStore::from_json(&json)?
                }
                None => MemoryStore::new(),
            };
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Repositories::memory(Arc::new(store)))
        }
    }
}
