use std::sync::Arc;

use tokio::sync::RwLock;

use crate::autosave::AutoSaveHandle;
use crate::config::Config;
use crate::export::Exporters;
use crate::persistence::CvPersistence;
use crate::store::CvStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The session's CV. Handlers clone a snapshot before any persistence I/O.
    pub store: Arc<RwLock<CvStore>>,
    pub persistence: Arc<CvPersistence>,
    pub autosave: AutoSaveHandle,
    pub exporters: Exporters,
    pub config: Config,
}

impl AppState {
    /// Hands the current aggregate to the debounced auto-saver.
    pub fn schedule_autosave(&self, store: &CvStore) {
        self.autosave.schedule(store.cv().clone());
    }
}
