use smartreads_library::{
    adapters::{
        file::FileSnapshotStore, memory::SnapshotStore as MemorySnapshotStore,
        mock::UserDirectory as MockUserDirectory, postgres::PostgresSnapshotStore,
    },
    api::{handlers::AppState, router::create_router},
    application::{Library, LoadOptions, Session},
    config::{AppConfig, StorageBackend},
    ports::SnapshotStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartreads_library=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(storage = ?config.storage, port = config.port, "Starting SmartReads library");

    // Initialize adapters
    let store = open_store(&config.storage).await?;
    let directory = Arc::new(MockUserDirectory::new());

    let library = Library::load(
        store.clone(),
        LoadOptions {
            seed_sample_catalog: config.seed_sample_catalog,
        },
    )
    .await?;
    let session = Session::restore(store, directory).await?;

    // Create application state
    let app_state = Arc::new(AppState::new(library, session));

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_store(backend: &StorageBackend) -> Result<Arc<dyn SnapshotStore>, BoxError> {
    match backend {
        StorageBackend::File { data_dir } => {
            let store = FileSnapshotStore::open(data_dir.clone()).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Postgres { database_url } => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Ok(Arc::new(PostgresSnapshotStore::new(pool)))
        }
        StorageBackend::Memory => Ok(Arc::new(MemorySnapshotStore::new())),
    }
}
