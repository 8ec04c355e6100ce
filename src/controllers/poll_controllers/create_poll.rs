use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::controllers::poll_controllers::models::{
    parse_end_date, required_text, CreatePollRequest, PollResponse,
};
use crate::models::poll_models::PollDraft;
use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::extract::JsonBody;

pub async fn create_poll(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(payload): JsonBody<CreatePollRequest>,
) -> AppResult<(StatusCode, Json<PollResponse>)> {
    let title = required_text(&payload.title, "Title")?;
    let description = required_text(&payload.description, "Description")?;
    let end_date = parse_end_date(&payload.end_date)?;

    let options: Vec<String> = payload
        .options
        .iter()
        .map(|opt| opt.trim().to_string())
        .filter(|opt| !opt.is_empty())
        .collect();

    if options.len() < 2 {
        return Err(AppError::ValidationError(
            "Enter at least 2 options for the user to select from".to_string(),
        ));
    }

    let mut deduped_options: Vec<&String> = Vec::new();
    for option in &options {
        if !deduped_options.contains(&option) {
            deduped_options.push(option);
        }
    }

    if deduped_options.len() != options.len() {
        return Err(AppError::ValidationError("Poll options must be unique".to_string()));
    }

    let poll = state
        .polls
        .create(PollDraft {
            title,
            description,
            options,
            created_by: caller.id.clone(),
            end_date,
        })
        .await?;

    info!(poll_id = %poll.id, created_by = %caller.id, "poll created");

    let poll_res = PollResponse::new(poll, Some(caller.name.clone()), &caller, chrono::Utc::now());
    Ok((StatusCode::CREATED, Json(poll_res)))
}
