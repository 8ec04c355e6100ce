use axum::{
    extract::{Extension, State},
    Json,
};

use crate::controllers::poll_controllers::models::PollResponse;
use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_all_polls(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<PollResponse>>> {
    let polls = state.polls.list().await?;

    let poll_responses = PollResponse::for_polls(&state, polls, &caller).await?;

    Ok(Json(poll_responses))
}
