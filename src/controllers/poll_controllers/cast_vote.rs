use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::controllers::poll_controllers::models::{CastVoteRequest, PollResponse, VoteResponse};
use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::extract::JsonBody;

pub async fn cast_vote(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(payload): JsonBody<CastVoteRequest>,
) -> AppResult<Json<VoteResponse>> {
    if payload.option_id.trim().is_empty() {
        return Err(AppError::ValidationError("optionId is required".to_string()));
    }

    let poll = state
        .polls
        .cast_vote(&poll_id, &payload.option_id, &caller.id, Utc::now())
        .await
        .map_err(|e| {
            debug!(poll_id = %poll_id, user_id = %caller.id, error = %e, "vote rejected");
            e
        })?;

    info!(poll_id = %poll.id, user_id = %caller.id, "vote registered");

    // The vote is committed; nothing below may turn it into an error.
    let creator_name = match state.users.find_by_id(&poll.created_by).await {
        Ok(creator) => creator.map(|user| user.name),
        Err(e) => {
            warn!(poll_id = %poll.id, error = %e, "creator lookup failed after vote");
            None
        }
    };

    Ok(Json(VoteResponse {
        message: "Vote registered".to_string(),
        poll: PollResponse::new(poll, creator_name, &caller, Utc::now()),
    }))
}
