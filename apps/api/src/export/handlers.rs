use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::info;

use crate::errors::AppError;
use crate::export::ExportFormat;
use crate::state::AppState;

/// GET /api/v1/cv/export/:format
pub async fn handle_export(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let format: ExportFormat = format.parse()?;
    let exporter = state.exporters.get(format)?;
    let snapshot = state.store.read().await.cv().clone();

    // Layout and compression are CPU-bound.
    let document = tokio::task::spawn_blocking(move || exporter.export(&snapshot))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))??;

    info!(
        "Exported CV as {} ({} bytes)",
        document.format,
        document.content.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.filename),
            ),
        ],
        document.content,
    ))
}
