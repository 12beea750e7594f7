mod autosave;
mod config;
mod errors;
mod export;
mod ids;
mod models;
mod persistence;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::autosave::AutoSaver;
use crate::config::{Config, StoreBackend};
use crate::export::Exporters;
use crate::persistence::file::FileStore;
use crate::persistence::memory::MemoryStore;
use crate::persistence::redis_store::RedisStore;
use crate::persistence::slot_store::{Slot, SlotStore};
use crate::persistence::CvPersistence;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::CvStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV builder API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize slot storage
    let slot_store = build_slot_store(&config).await?;
    info!("Slot store initialized (backend: {})", slot_store.backend_name());
    let persistence = Arc::new(CvPersistence::new(
        slot_store,
        config.store_key_prefix.clone(),
    ));

    // Hydrate the session from the newer of the two slots
    let store = hydrate(&persistence).await;

    // Start the debounced auto-saver
    let (autosave, autosave_task) =
        AutoSaver::spawn(persistence.clone(), config.autosave_debounce);
    info!(
        "Auto-saver started (debounce: {}ms)",
        config.autosave_debounce.as_millis()
    );

    // Build app state
    let state = AppState {
        store: Arc::new(RwLock::new(store)),
        persistence,
        autosave,
        exporters: Exporters::standard(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    // The router (and with it every auto-save handle) is gone; wait for the final flush.
    autosave_task.await?;

    Ok(())
}

/// Constructs the slot store selected by `STORE_BACKEND`.
async fn build_slot_store(config: &Config) -> Result<Arc<dyn SlotStore>> {
    let store: Arc<dyn SlotStore> = match &config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(
            usize::try_from(config.store_quota_bytes).unwrap_or(usize::MAX),
        )),
        StoreBackend::File { dir } => {
            info!("File slot store at {}", dir.display());
            Arc::new(FileStore::open(dir, config.store_quota_bytes)?)
        }
        StoreBackend::Redis { url } => Arc::new(RedisStore::connect(url).await?),
    };
    Ok(store)
}

/// A store holding the newer persisted copy, or a fresh CV when nothing is persisted.
/// An auto-saved copy newer than the last explicit save starts the session dirty.
async fn hydrate(persistence: &CvPersistence) -> CvStore {
    let mut store = CvStore::new();
    match persistence.load_newest().await {
        Some((cv, slot)) => {
            info!("Restored CV {} from {} slot", cv.id, slot.name());
            store.load(cv);
            if slot == Slot::AutoSave {
                store.mark_dirty();
            }
        }
        None => info!("No persisted CV found; starting empty"),
    }
    store
}
