use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::controllers::poll_controllers::models::PollResponse;
use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<PollResponse>> {
    let poll = state.polls.get(&poll_id).await?;

    Ok(Json(PollResponse::for_poll(&state, poll, &caller).await?))
}
