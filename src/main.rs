use navdesk_api::app::{self, AppState};
use navdesk_api::config;
use navdesk_api::database::DatabaseManager;
use navdesk_api::navigation::{EditorPolicy, MemoryNavigationStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting navdesk-api in {:?} mode", config.environment);
    if navdesk_api::is_production!() && config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; /api/navigation will reject every request");
    }

    let policy = EditorPolicy::from_config(&config.hierarchy);
    let state = if DatabaseManager::is_configured() {
        AppState::postgres(policy).await?
    } else {
        tracing::warn!("DATABASE_URL not set; serving from an empty in-memory store");
        AppState::in_memory(MemoryNavigationStore::new(), policy)
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("navdesk-api listening on http://{}", bind_addr);

    axum::serve(listener, app::router(state)).await?;
    Ok(())
}
