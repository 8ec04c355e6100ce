use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;
use tracing::info;

use crate::{state::AppState, utils::error::AppResult};

pub async fn delete_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let removed = state.users.remove(&user_id).await?;

    info!(user_id = %removed.id, "user removed");

    Ok(Json(json!({ "message": "User removed" })))
}
