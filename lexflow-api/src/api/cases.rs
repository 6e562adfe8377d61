//! Staff case endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use lexflow_common::{CaseStatus, IntakeRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub id: String,
    pub status: CaseStatus,
    pub message: String,
}

/// GET /case/:id
pub async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<IntakeRecord>> {
    info!(intake_id = %id, "Case detail request");
    Ok(Json(state.service.case_detail(&id).await?))
}

/// POST /case/:id/status
pub async fn update_case_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<StatusUpdateResponse>> {
    let Json(request) = payload?;
    info!(intake_id = %id, "Status update request");

    let status = state
        .service
        .transition(&id, &request.status, &request.note)
        .await?;

    Ok(Json(StatusUpdateResponse {
        message: format!("Case successfully marked as {}.", status),
        id,
        status,
    }))
}
