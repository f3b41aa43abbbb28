use anyhow::Context;
use gate_api_rust::{
    auth::AdminGate,
    config::{Config, StoreBackend},
    constants::API_NAME,
    handlers::{self, AppState},
    repository::{GateStore, InMemoryGateStore, PgGateStore},
    service::GateDecisionEngine,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("{} Starting gate server on port {}", API_NAME, config.server_port);

    let store: Arc<dyn GateStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&config.database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("{} Connected to database", API_NAME);

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("{} Database migrations completed", API_NAME);

            Arc::new(PgGateStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("{} Using in-memory store; records are lost on restart", API_NAME);
            Arc::new(InMemoryGateStore::new())
        }
    };

    let engine = GateDecisionEngine::new(store, config.rules.clone());
    let admin = AdminGate::new(&config.admin_password_file);
    if !admin.has_password() {
        tracing::warn!(
            "{} No admin password set; admin routes stay locked until one is created",
            API_NAME
        );
    }

    let app = handlers::app(AppState::new(engine, admin));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("{} Server listening on {}", API_NAME, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
