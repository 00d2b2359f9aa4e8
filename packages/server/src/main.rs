use std::net::SocketAddr;
use std::sync::Arc;

use common::book::MAX_UPLOAD_SIZE;
use common::storage::filesystem::FilesystemBlobStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::service::BookService;
use server::state::AppState;
use server::store::{SeaOrmBookStore, SeaOrmUserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let max_level = if config.is_development() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(max_level).init();

    config.log_summary();

    let db = server::database::init_db(
        &config.database.connection_url(),
        config.is_development(),
    )
    .await?;
    server::seed::ensure_indexes(&db).await?;
    info!("Database ready");

    let blobs =
        FilesystemBlobStore::new(config.storage.upload_dir.clone(), MAX_UPLOAD_SIZE).await?;
    info!(upload_dir = %blobs.base_path().display(), "Blob store ready");

    let state = AppState {
        users: Arc::new(SeaOrmUserStore::new(db.clone())),
        books: BookService::new(Arc::new(SeaOrmBookStore::new(db)), Arc::new(blobs)),
        config: config.clone(),
    };

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
