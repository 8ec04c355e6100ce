use axum::{
    extract::{Extension, State},
    Json,
};

use crate::controllers::poll_controllers::models::PollResponse;
use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::AppResult;

/// Most recently created polls, newest first.
pub async fn get_poll_feed(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<PollResponse>>> {
    let recent = state.polls.recent(state.config.feed_limit).await?;

    Ok(Json(PollResponse::for_polls(&state, recent, &caller).await?))
}
