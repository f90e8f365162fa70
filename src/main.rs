use anyhow::Context;
use taskflow::{
    application::{persistence::Persistence, task_store::TaskStore},
    config::AppConfig,
    domain::storage::KeyValueStorage,
    http::routing::{self, AppState},
    infrastructure::{file_storage::FileStorage, memory_storage::MemoryStorage},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    let storage: Box<dyn KeyValueStorage> = match &config.data_dir {
        Some(dir) => {
            let storage = FileStorage::open(dir)
                .with_context(|| format!("opening data directory {}", dir.display()))?
                .with_quota(config.quota_bytes);
            tracing::info!(dir = %dir.display(), quota = config.quota_bytes, "using file storage");
            Box::new(storage)
        }
        None => {
            tracing::info!(quota = config.quota_bytes, "TASKFLOW_DATA_DIR not set; data lives in memory for this session");
            Box::new(MemoryStorage::with_quota(config.quota_bytes))
        }
    };

    let mut store = TaskStore::open(Persistence::new(storage));
    store.subscribe(|s| tracing::debug!(todos = s.todos.len(), categories = s.categories.len(), "store changed"));
    let router = routing::app(routing::api(AppState::new(store)));

    tracing::info!(addr = %config.addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
