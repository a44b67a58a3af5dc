//! Import and reconciliation API handlers.
//!
//! POST /import classifies an uploaded batch; when review is needed the
//! staged batch is fetched from GET /import/pending/:user and finalized via
//! POST /import/resolve or POST /import/skip.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::UploadLogEntry;

use crate::db::upload_log;
use crate::error::{ApiError, ApiResult};
use crate::import::{
    apply_resolution, classify_batch, skip_all, ImportOutcome, PendingBatch, RawRow,
    ResolveSelection, ResolveSummary,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Acting user; owns the staged batch when review is needed.
    pub user: String,
    /// Source filename, recorded in the audit log.
    pub filename: String,
    pub rows: Vec<RawRow>,
}

/// POST /import
///
/// Classify a batch of rows. Unambiguous inserts are committed before this
/// returns; `needs_review` in the response signals that a pending batch was
/// staged for the user.
pub async fn upload_rows(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<ImportOutcome>> {
    if request.user.trim().is_empty() {
        return Err(ApiError::BadRequest("user must not be empty".to_string()));
    }

    let outcome = classify_batch(
        &state.db,
        &state.staging,
        request.user.trim(),
        &request.filename,
        &request.rows,
    )
    .await?;

    Ok(Json(outcome))
}

/// GET /import/pending/:user
///
/// The staged batch awaiting the user's review; 404 when there is none.
pub async fn pending_batch(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<Json<PendingBatch>> {
    state
        .staging
        .get(&user)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No pending batch for user: {}", user)))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub user: String,
    #[serde(flatten)]
    pub selection: ResolveSelection,
}

/// POST /import/resolve
///
/// Apply the selected conflicts and fills, leave everything else untouched,
/// and close the import cycle.
pub async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<ResolveSummary>> {
    let summary =
        apply_resolution(&state.db, &state.staging, &request.user, &request.selection).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct SkipRequest {
    pub user: String,
}

/// POST /import/skip
///
/// Abandon every staged item; the catalog keeps its current values.
pub async fn skip(
    State(state): State<AppState>,
    Json(request): Json<SkipRequest>,
) -> ApiResult<Json<ResolveSummary>> {
    let summary = skip_all(&state.db, &state.staging, &request.user).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct UploadLogQuery {
    #[serde(default = "default_log_limit")]
    pub limit: i64,
}

fn default_log_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct UploadLogResponse {
    pub uploads: Vec<UploadLogEntry>,
}

/// GET /import/log - recent upload audit entries, newest first.
pub async fn upload_history(
    State(state): State<AppState>,
    Query(query): Query<UploadLogQuery>,
) -> ApiResult<Json<UploadLogResponse>> {
    let uploads = upload_log::list_recent(&state.db, query.limit.clamp(1, 500)).await?;
    Ok(Json(UploadLogResponse { uploads }))
}

pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import", post(upload_rows))
        .route("/import/pending/:user", get(pending_batch))
        .route("/import/resolve", post(resolve))
        .route("/import/skip", post(skip))
        .route("/import/log", get(upload_history))
}
