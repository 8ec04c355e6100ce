use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;
use tracing::info;

use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn delete_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    state.polls.delete(&poll_id).await?;

    info!(poll_id = %poll_id, "poll removed");

    Ok(Json(json!({ "message": "Poll removed" })))
}
