//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Draft handlers lock the session table before the workspace, and every
//! handler that mutates storage takes the workspace write lock, so
//! concurrent autosaves of one draft are applied one after the other.

use super::{
    AppState,
    types::{
        ApiError, CreatePassiveRequest, CreateReportRequest, DraftResponse, DraftUpdateResponse,
        ExportResponse, HealthResponse, OpenDraftRequest, PhotoUploadRequest, ReportListQuery,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use fieldkit_core::{
    Asset, AssetDraft, AssetId, Evaluation, PassiveItem, Photo, PhotoId, Report, ReportId,
    SavedAsset, WorkspaceStatus,
    export::{bundle_checksum, export_json, export_report},
};
use std::time::Instant;

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Workspace counters.
pub async fn status_handler(State(state): State<AppState>) -> ApiResult<Json<WorkspaceStatus>> {
    let workspace = state.workspace.read().await;
    Ok(Json(workspace.status()?))
}

// =============================================================================
// REPORT HANDLERS
// =============================================================================

pub async fn list_reports_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportListQuery>,
) -> ApiResult<Json<Vec<Report>>> {
    let workspace = state.workspace.read().await;
    Ok(Json(workspace.list_reports(query.trashed)?))
}

pub async fn create_report_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let mut workspace = state.workspace.write().await;
    let report = workspace.create_report(&request.name, &request.node_name)?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn trash_report_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Report>> {
    let mut workspace = state.workspace.write().await;
    Ok(Json(workspace.trash_report(ReportId(id))?))
}

pub async fn restore_report_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Report>> {
    let mut workspace = state.workspace.write().await;
    Ok(Json(workspace.restore_report(ReportId(id))?))
}

/// Delete a report with everything it owns.
pub async fn purge_report_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    let mut workspace = state.workspace.write().await;
    workspace.purge_report(ReportId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_assets_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Vec<Asset>>> {
    let workspace = state.workspace.read().await;
    let report = workspace.report(ReportId(id))?;
    Ok(Json(workspace.assets(report.id)?))
}

pub async fn list_passives_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Vec<PassiveItem>>> {
    let workspace = state.workspace.read().await;
    let report = workspace.report(ReportId(id))?;
    Ok(Json(workspace.passives(report.id)?))
}

pub async fn create_passive_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<CreatePassiveRequest>,
) -> ApiResult<(StatusCode, Json<PassiveItem>)> {
    let mut workspace = state.workspace.write().await;
    let report = workspace.report(ReportId(id))?;
    let item = workspace.add_passive(
        report.id,
        &request.address,
        request.kind,
        &request.observation,
    )?;
    Ok((StatusCode::CREATED, Json(item)))
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export a report as a base64-wrapped JSON document.
pub async fn export_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<ExportResponse>> {
    let workspace = state.workspace.read().await;
    let checksum = bundle_checksum(&export_report(&workspace, ReportId(id))?)?;
    let data = export_json(&workspace, ReportId(id))?;
    Ok(Json(ExportResponse::success(&data, checksum)))
}

// =============================================================================
// ASSET HANDLERS
// =============================================================================

/// Evaluate a draft without saving it.
pub async fn validate_handler(
    State(state): State<AppState>,
    Json(draft): Json<AssetDraft>,
) -> ApiResult<Json<Evaluation>> {
    let workspace = state.workspace.read().await;
    Ok(Json(workspace.evaluate_draft(&draft)?))
}

/// Explicit save: rejects incomplete drafts and taken positions.
pub async fn save_asset_handler(
    State(state): State<AppState>,
    Json(mut draft): Json<AssetDraft>,
) -> ApiResult<(StatusCode, Json<SavedAsset>)> {
    let mut workspace = state.workspace.write().await;
    let saved = workspace.save_asset(&mut draft)?;
    let status = if saved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(saved)))
}

pub async fn delete_asset_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    let mut workspace = state.workspace.write().await;
    workspace.delete_asset(AssetId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PHOTO HANDLERS
// =============================================================================

/// Attach a photo to a saved asset.
pub async fn upload_photo_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<PhotoUploadRequest>,
) -> ApiResult<(StatusCode, Json<Photo>)> {
    let bytes = request.decode()?;
    let mut workspace = state.workspace.write().await;
    let photo = workspace.add_photo(AssetId(id), request.category, &bytes, request.location)?;
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn delete_photo_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    let mut workspace = state.workspace.write().await;
    workspace.remove_photo(PhotoId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// DRAFT SESSION HANDLERS
// =============================================================================

/// Open an autosave session.
pub async fn open_draft_handler(
    State(state): State<AppState>,
    Json(request): Json<OpenDraftRequest>,
) -> ApiResult<(StatusCode, Json<DraftResponse>)> {
    let mut drafts = state.drafts.lock().await;
    let workspace = state.workspace.read().await;

    for stale in drafts.expire(Instant::now()) {
        let session = stale.session();
        if let Err(e) = stale.discard(&workspace) {
            tracing::warn!(session, "Dropping expired draft session failed: {}", e);
        } else {
            tracing::debug!(session, "Expired draft session dropped");
        }
    }

    let draft = match request {
        OpenDraftRequest::Edit { asset_id } => workspace.load_draft(asset_id)?,
        OpenDraftRequest::New { report_id, kind } => {
            let report = workspace.report(report_id)?;
            AssetDraft::new(report.id, kind)
        }
    };
    let evaluation = workspace.evaluate_draft(&draft)?;
    let trigger = drafts.open(draft);

    Ok((
        StatusCode::CREATED,
        Json(DraftResponse {
            session: trigger.session(),
            draft: trigger.draft().clone(),
            evaluation,
        }),
    ))
}

/// Replace the draft fields, recompute and autosave.
pub async fn update_draft_handler(
    State(state): State<AppState>,
    Path(session): Path<u64>,
    Json(edits): Json<AssetDraft>,
) -> ApiResult<Json<DraftUpdateResponse>> {
    let mut drafts = state.drafts.lock().await;
    let trigger = drafts
        .get_mut(session)
        .ok_or(ApiError::SessionNotFound(session))?;
    let mut workspace = state.workspace.write().await;

    let outcome = trigger.update(&mut workspace, edits);
    Ok(Json(DraftUpdateResponse {
        session,
        draft: trigger.draft().clone(),
        outcome,
    }))
}

/// Capture a photo for a draft session, then recompute.
pub async fn draft_photo_handler(
    State(state): State<AppState>,
    Path(session): Path<u64>,
    Json(request): Json<PhotoUploadRequest>,
) -> ApiResult<Json<DraftUpdateResponse>> {
    let bytes = request.decode()?;
    let mut drafts = state.drafts.lock().await;
    let trigger = drafts
        .get_mut(session)
        .ok_or(ApiError::SessionNotFound(session))?;
    let mut workspace = state.workspace.write().await;

    let outcome = trigger.add_photo(&mut workspace, request.category, &bytes, request.location)?;
    Ok(Json(DraftUpdateResponse {
        session,
        draft: trigger.draft().clone(),
        outcome,
    }))
}

/// Close a draft session, dropping photos that were never saved.
pub async fn close_draft_handler(
    State(state): State<AppState>,
    Path(session): Path<u64>,
) -> ApiResult<StatusCode> {
    let mut drafts = state.drafts.lock().await;
    let trigger = drafts
        .close(session)
        .ok_or(ApiError::SessionNotFound(session))?;
    let workspace = state.workspace.read().await;
    trigger.discard(&workspace)?;
    Ok(StatusCode::NO_CONTENT)
}
