use serde::{Deserialize, Serialize};

use crate::models::poll_models::PollStatus;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PollStat {
    pub id: String,
    pub title: String,
    pub status: PollStatus,
    pub total_votes: u64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total_polls: u64,
    pub active_polls: u64,
    pub total_users: u64,
    pub total_votes: u64,
    pub poll_stats: Vec<PollStat>,
}
