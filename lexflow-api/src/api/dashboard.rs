//! Dashboard endpoint

use axum::extract::State;
use axum::Json;
use lexflow_common::Summary;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// GET /dashboard
///
/// Scans every stored case. A failed scan is a 500, never a partial summary.
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<Summary>> {
    info!("Dashboard request received");
    Ok(Json(state.service.dashboard().await?))
}
