//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, MemoryStore, WorkbookReader},
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use catalog_core::access::AllowListPolicy;
use catalog_core::ports::{AccountStore, RecordStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Store & Run Migrations ---
    let (books, accounts): (Arc<dyn RecordStore>, Arc<dyn AccountStore>) =
        if config.uses_memory_store() {
            info!("Using the in-process store; data will not survive a restart.");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn RecordStore>, store as Arc<dyn AccountStore>)
        } else {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&config.database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            (db_adapter.clone() as Arc<dyn RecordStore>, db_adapter as Arc<dyn AccountStore>)
        };

    // --- 3. Build the Shared AppState ---
    let policy = AllowListPolicy::new(config.authorized_emails.iter());
    info!("{} address(es) on the access allow-list", policy.len());
    let app_state = Arc::new(AppState {
        books,
        accounts,
        policy: Arc::new(policy),
        spreadsheet: Arc::new(WorkbookReader::new()),
        config: config.clone(),
    });

    // --- 4. Create the Web Router & Start the Server ---
    let app = build_router(app_state)?;
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
