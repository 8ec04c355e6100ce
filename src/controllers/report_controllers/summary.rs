use axum::{extract::State, Json};

use crate::controllers::report_controllers::models::{PollStat, SummaryResponse};
use crate::models::{poll_models::PollStatus, user_models::Role};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_voting_summary(State(state): State<AppState>) -> AppResult<Json<SummaryResponse>> {
    let polls = state.polls.list().await?;
    let total_users = state.users.count_by_role(Role::User).await?;

    let poll_stats: Vec<PollStat> = polls
        .iter()
        .map(|poll| PollStat {
            id: poll.id.clone(),
            title: poll.title.clone(),
            status: poll.status,
            total_votes: poll.total_votes(),
        })
        .collect();

    Ok(Json(SummaryResponse {
        total_polls: polls.len() as u64,
        active_polls: polls
            .iter()
            .filter(|poll| poll.status == PollStatus::Active)
            .count() as u64,
        total_users,
        total_votes: poll_stats.iter().map(|stat| stat.total_votes).sum(),
        poll_stats,
    }))
}
