//! Intake submission endpoint

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lexflow_common::{ClientInput, IntakeRecord};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// POST /intake
///
/// Returns 201 with the stored record. Blank client fields are a 400;
/// classifier failures and rejected classifier output are a 502.
pub async fn submit_intake(
    State(state): State<AppState>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IntakeRecord>)> {
    let Json(input) = payload?;
    info!("Intake submission received");

    let record = state.service.submit(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
