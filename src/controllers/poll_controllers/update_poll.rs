use axum::{
    extract::{Extension, Path, State},
    Json,
};
use tracing::info;

use crate::controllers::poll_controllers::models::{
    parse_end_date, required_text, PollResponse, UpdatePollRequest,
};
use crate::models::poll_models::PollUpdate;
use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::JsonBody;

pub async fn update_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(payload): JsonBody<UpdatePollRequest>,
) -> AppResult<Json<PollResponse>> {
    let update = PollUpdate {
        title: payload
            .title
            .as_deref()
            .map(|title| required_text(title, "Title"))
            .transpose()?,
        description: payload
            .description
            .as_deref()
            .map(|description| required_text(description, "Description"))
            .transpose()?,
        status: payload.status,
        end_date: payload.end_date.as_deref().map(parse_end_date).transpose()?,
    };

    let poll = if update.is_empty() {
        state.polls.get(&poll_id).await?
    } else {
        state.polls.update(&poll_id, update).await?
    };

    info!(poll_id = %poll.id, status = poll.status.as_str(), "poll updated");

    Ok(Json(PollResponse::for_poll(&state, poll, &caller).await?))
}
