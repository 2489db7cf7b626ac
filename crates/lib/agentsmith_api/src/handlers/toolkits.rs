//! Toolkit metadata lookup.

use axum::Json;
use axum::extract::{Query, State};

use super::{credential, required};
use crate::AppState;
use crate::error::AppResult;
use crate::models::{ToolkitInfoQuery, ToolkitInfoResponse};

/// `GET /api/toolkit-info?slug=&platformApiKey=`
pub async fn toolkit_info(
    State(state): State<AppState>,
    Query(query): Query<ToolkitInfoQuery>,
) -> AppResult<Json<ToolkitInfoResponse>> {
    let slug = required(query.slug, "Missing required parameters")?;
    let key = credential(
        query.platform_api_key.as_deref(),
        None,
        "Missing required parameters",
    )?;

    let toolkit = agentsmith_core::toolkit::fetch_toolkit(&*state.platform, &key, &slug).await?;
    Ok(Json(ToolkitInfoResponse {
        success: true,
        toolkit,
    }))
}
