use std::net::SocketAddr;
use std::sync::Arc;

use careers_backend::{
    config::{Config, StorageBackend},
    database::pool::create_pool,
    router,
    storage::{memory::MemoryStore, postgres::PostgresStore, ApplicationStore},
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = Config::from_env()?;

    let store: Arc<dyn ApplicationStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
            let pool = create_pool(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Using Postgres storage backend");
            Arc::new(PostgresStore::new(pool))
        }
        StorageBackend::Memory => {
            info!("Using in-memory document storage backend");
            Arc::new(MemoryStore::new())
        }
    };

    let addr: SocketAddr = config.server_address.parse()?;
    let app_state = AppState::new(config, store);
    let app = router(app_state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
