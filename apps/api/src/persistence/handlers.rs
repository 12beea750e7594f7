use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::persistence::SaveReport;
use crate::state::AppState;
use crate::store::handlers::CvView;

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    #[serde(flatten)]
    pub report: SaveReport,
    pub dirty: bool,
}

/// POST /api/v1/cv/save
///
/// The outcome (including a failed write) is reported in the body with a notice;
/// the dirty flag clears only if the session did not change while writing.
pub async fn handle_save(State(state): State<AppState>) -> Json<SaveResponse> {
    let snapshot = state.store.read().await.cv().clone();
    let report = state.persistence.save(&snapshot).await;

    let mut store = state.store.write().await;
    if report.outcome.is_persisted() && store.cv() == &snapshot {
        store.mark_saved();
    }
    Json(SaveResponse {
        report,
        dirty: store.is_dirty(),
    })
}

/// POST /api/v1/cv/load
pub async fn handle_load(State(state): State<AppState>) -> Result<Json<CvView>, AppError> {
    let cv = state
        .persistence
        .load()
        .await
        .ok_or_else(|| AppError::NotFound("No saved CV".to_string()))?;

    let mut store = state.store.write().await;
    store.load(cv);
    Ok(Json(CvView::of(&store)))
}

/// POST /api/v1/cv/restore-autosave
/// The restored copy has not been explicitly saved, so the session stays dirty.
pub async fn handle_restore_autosave(
    State(state): State<AppState>,
) -> Result<Json<CvView>, AppError> {
    let cv = state
        .persistence
        .load_auto_saved()
        .await
        .ok_or_else(|| AppError::NotFound("No auto-saved CV".to_string()))?;

    let mut store = state.store.write().await;
    store.load(cv);
    store.mark_dirty();
    Ok(Json(CvView::of(&store)))
}

/// POST /api/v1/cv/reset
/// Starts a fresh CV and purges both persisted slots.
pub async fn handle_reset(State(state): State<AppState>) -> Json<CvView> {
    let view = {
        let mut store = state.store.write().await;
        store.reset();
        CvView::of(&store)
    };
    state.autosave.cancel_pending().await;
    state.persistence.clear().await;
    info!("CV session reset");
    Json(view)
}
