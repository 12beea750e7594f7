use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::customization::{HexColor, TemplateId};
use crate::models::patch::{
    CustomizationPatch, EducationPatch, ExperiencePatch, LanguagePatch, NewEducation,
    NewExperience, NewLanguage, NewSkill, PersonalInfoPatch, SkillPatch,
};
use crate::models::CvAggregate;
use crate::state::AppState;
use crate::store::completeness::{compute_completeness_report, CompletenessReport};
use crate::store::CvStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvView {
    pub cv: CvAggregate,
    /// Unsaved changes relative to the last explicit save.
    pub dirty: bool,
}

impl CvView {
    pub fn of(store: &CvStore) -> Self {
        Self {
            cv: store.cv().clone(),
            dirty: store.is_dirty(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub view: CvView,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateRequest {
    pub template: TemplateId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ColorsRequest {
    pub primary_color: HexColor,
    pub secondary_color: HexColor,
}

/// Runs one mutation under the write lock and schedules an auto-save if the session
/// now holds unsaved changes.
async fn mutate<T>(
    state: &AppState,
    op: impl FnOnce(&mut CvStore) -> Result<T, AppError>,
) -> Result<(T, CvView), AppError> {
    let mut store = state.store.write().await;
    let out = op(&mut store)?;
    if store.is_dirty() {
        state.schedule_autosave(&store);
    }
    Ok((out, CvView::of(&store)))
}

fn stale(kind: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{kind} entry {id} not found"))
}

fn found(hit: bool, kind: &str, id: Uuid) -> Result<(), AppError> {
    if hit {
        Ok(())
    } else {
        Err(stale(kind, id))
    }
}

fn created((id, view): (Uuid, CvView)) -> (StatusCode, Json<CreatedResponse>) {
    (StatusCode::CREATED, Json(CreatedResponse { id, view }))
}

/// GET /api/v1/cv
pub async fn handle_get_cv(State(state): State<AppState>) -> Json<CvView> {
    Json(CvView::of(&*state.store.read().await))
}

/// GET /api/v1/cv/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateId>> {
    Json(TemplateId::ALL.to_vec())
}

/// GET /api/v1/cv/completeness
pub async fn handle_completeness(State(state): State<AppState>) -> Json<CompletenessReport> {
    Json(compute_completeness_report(state.store.read().await.cv()))
}

// ── personal info & customization ──────────────────────────────────────────

/// PATCH /api/v1/cv/personal
pub async fn handle_update_personal(
    State(state): State<AppState>,
    Json(patch): Json<PersonalInfoPatch>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) = mutate(&state, |s| Ok(s.update_personal_info(patch)?)).await?;
    Ok(Json(view))
}

/// PATCH /api/v1/cv/customization
pub async fn handle_update_customization(
    State(state): State<AppState>,
    Json(patch): Json<CustomizationPatch>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) = mutate(&state, |s| {
        s.update_customization(patch);
        Ok(())
    })
    .await?;
    Ok(Json(view))
}

/// PUT /api/v1/cv/customization/template
pub async fn handle_set_template(
    State(state): State<AppState>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) = mutate(&state, |s| {
        s.set_template(req.template);
        Ok(())
    })
    .await?;
    Ok(Json(view))
}

/// PUT /api/v1/cv/customization/colors
pub async fn handle_set_colors(
    State(state): State<AppState>,
    Json(req): Json<ColorsRequest>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) = mutate(&state, |s| {
        s.set_colors(req.primary_color, req.secondary_color);
        Ok(())
    })
    .await?;
    Ok(Json(view))
}

// ── experience ─────────────────────────────────────────────────────────────

/// POST /api/v1/cv/experience
pub async fn handle_add_experience(
    State(state): State<AppState>,
    Json(draft): Json<NewExperience>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    Ok(created(mutate(&state, |s| Ok(s.add_experience(draft)?)).await?))
}

/// PATCH /api/v1/cv/experience/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ExperiencePatch>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) = mutate(&state, |s| {
        found(s.update_experience(id, patch)?, "experience", id)
    })
    .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/cv/experience/:id
/// Idempotent: deleting an unknown id also answers 204.
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    mutate(&state, |s| Ok(s.delete_experience(id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/cv/experience/reorder
pub async fn handle_reorder_experience(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<CvView>, AppError> {
    let (_, view) = mutate(&state, |s| Ok(s.reorder_experience(req.from, req.to))).await?;
    Ok(Json(view))
}

// ── education ──────────────────────────────────────────────────────────────

/// POST /api/v1/cv/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    Json(draft): Json<NewEducation>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    Ok(created(mutate(&state, |s| Ok(s.add_education(draft)?)).await?))
}

/// PATCH /api/v1/cv/education/:id
pub async fn handle_update_education(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<EducationPatch>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) = mutate(&state, |s| {
        found(s.update_education(id, patch)?, "education", id)
    })
    .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/cv/education/:id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    mutate(&state, |s| Ok(s.delete_education(id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/cv/education/reorder
pub async fn handle_reorder_education(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<CvView>, AppError> {
    let (_, view) = mutate(&state, |s| Ok(s.reorder_education(req.from, req.to))).await?;
    Ok(Json(view))
}

// ── skills ─────────────────────────────────────────────────────────────────

/// POST /api/v1/cv/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Json(draft): Json<NewSkill>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    Ok(created(mutate(&state, |s| Ok(s.add_skill(draft))).await?))
}

/// PATCH /api/v1/cv/skills/:id
pub async fn handle_update_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SkillPatch>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) = mutate(&state, |s| found(s.update_skill(id, patch), "skill", id)).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/cv/skills/:id
pub async fn handle_delete_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    mutate(&state, |s| Ok(s.delete_skill(id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── languages ──────────────────────────────────────────────────────────────

/// POST /api/v1/cv/languages
pub async fn handle_add_language(
    State(state): State<AppState>,
    Json(draft): Json<NewLanguage>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    Ok(created(mutate(&state, |s| Ok(s.add_language(draft))).await?))
}

/// PATCH /api/v1/cv/languages/:id
pub async fn handle_update_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<LanguagePatch>,
) -> Result<Json<CvView>, AppError> {
    let ((), view) =
        mutate(&state, |s| found(s.update_language(id, patch), "language", id)).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/cv/languages/:id
pub async fn handle_delete_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    mutate(&state, |s| Ok(s.delete_language(id))).await?;
    Ok(StatusCode::NO_CONTENT)
}
