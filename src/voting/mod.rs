//! Vote transition rules.
//!
//! A poll is in exactly one of three states at any instant:
//!
//! - [`PollState::Open`]: status is active and `now <= end_date`
//! - [`PollState::Expired`]: status is active but the end date has passed
//! - [`PollState::Closed`]: status is closed, whatever the end date
//!
//! Only an open poll accepts votes. Votes are append-only: a recorded vote
//! increments exactly one option and appends exactly one voter id, so the sum
//! of option counters always equals the length of the voter list.
//!
//! The functions here are pure over a [`Poll`] value; the stores provide the
//! per-poll atomicity around [`apply_vote`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::poll_models::{Poll, PollStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    Open,
    Expired,
    Closed,
}

impl PollState {
    pub fn of(poll: &Poll, now: DateTime<Utc>) -> Self {
        match poll.status {
            PollStatus::Closed => PollState::Closed,
            PollStatus::Active if now > poll.end_date => PollState::Expired,
            PollStatus::Active => PollState::Open,
        }
    }

    pub fn accepts_votes(self) -> bool {
        self == PollState::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    #[error("Poll is closed")]
    PollClosed(PollState),
    #[error("You have already voted in this poll")]
    AlreadyVoted,
    #[error("Option not found")]
    OptionNotFound,
}

/// Runs every rejection check in order (closure, duplicate voter, option)
/// and returns the index of the option the vote would land on.
pub fn check_vote(
    poll: &Poll,
    option_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<usize, VoteError> {
    let state = PollState::of(poll, now);
    if !state.accepts_votes() {
        return Err(VoteError::PollClosed(state));
    }

    if poll.has_voted(user_id) {
        return Err(VoteError::AlreadyVoted);
    }

    poll.options
        .iter()
        .position(|option| option.id == option_id)
        .ok_or(VoteError::OptionNotFound)
}

/// Checks and records a vote. The poll is left untouched on rejection.
pub fn apply_vote(
    poll: &mut Poll,
    option_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<(), VoteError> {
    let index = check_vote(poll, option_id, user_id, now)?;

    poll.options[index].votes += 1;
    poll.voted_by.push(user_id.to_string());
    poll.updated_at = now;

    Ok(())
}
