//! Client portal lookup

use axum::extract::{Path, State};
use axum::Json;
use lexflow_common::PortalView;

use crate::error::ApiResult;
use crate::AppState;

/// GET /portal/:token
pub async fn get_portal_view(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<PortalView>> {
    Ok(Json(state.service.portal_view(&token).await?))
}
