use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::poll_models::{Poll, PollOption, PollStatus};
use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::voting::PollState;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub end_date: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PollStatus>,
    pub end_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub option_id: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreatorSummary {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub options: Vec<PollOption>,
    pub created_by: CreatorSummary,
    pub status: PollStatus,
    pub end_date: DateTime<Utc>,
    pub accepting_votes: bool,
    pub total_votes: u64,
    pub has_voted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct VoteResponse {
    pub message: String,
    pub poll: PollResponse,
}

impl PollResponse {
    pub fn new(poll: Poll, creator_name: Option<String>, caller: &Caller, now: DateTime<Utc>) -> Self {
        Self {
            accepting_votes: PollState::of(&poll, now).accepts_votes(),
            total_votes: poll.total_votes(),
            has_voted: poll.has_voted(&caller.id),
            created_by: CreatorSummary {
                id: poll.created_by,
                name: creator_name,
            },
            id: poll.id,
            title: poll.title,
            description: poll.description,
            options: poll.options,
            status: poll.status,
            end_date: poll.end_date,
            created_at: poll.created_at,
            updated_at: poll.updated_at,
        }
    }

    /// Builds responses for many polls, looking each creator up once.
    pub async fn for_polls(
        state: &AppState,
        polls: Vec<Poll>,
        caller: &Caller,
    ) -> AppResult<Vec<PollResponse>> {
        let now = Utc::now();
        let mut names: HashMap<String, Option<String>> = HashMap::new();
        let mut responses = Vec::with_capacity(polls.len());

        for poll in polls {
            if !names.contains_key(&poll.created_by) {
                let name = state
                    .users
                    .find_by_id(&poll.created_by)
                    .await?
                    .map(|user| user.name);
                names.insert(poll.created_by.clone(), name);
            }
            let name = names.get(&poll.created_by).cloned().flatten();
            responses.push(PollResponse::new(poll, name, caller, now));
        }

        Ok(responses)
    }

    pub async fn for_poll(state: &AppState, poll: Poll, caller: &Caller) -> AppResult<PollResponse> {
        let name = state
            .users
            .find_by_id(&poll.created_by)
            .await?
            .map(|user| user.name);
        Ok(PollResponse::new(poll, name, caller, Utc::now()))
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_end_date(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| AppError::ValidationError(format!("Invalid endDate: {raw}")))
}

/// Trims a required text field, rejecting blanks.
pub fn required_text(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(value.to_string())
}
