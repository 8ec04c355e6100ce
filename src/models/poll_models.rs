use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    #[default]
    Active,
    Closed,
}

impl PollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollStatus::Active => "active",
            PollStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub title: String,
    pub description: String,
    pub options: Vec<PollOption>,
    pub created_by: String,
    pub status: PollStatus,
    pub end_date: DateTime<Utc>,
    /// Every user id appears here at most once.
    pub voted_by: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    pub votes: u64,
}

impl Poll {
    /// Builds a fresh poll from a draft with zeroed counters and new ids.
    pub fn from_draft(draft: PollDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            options: draft
                .options
                .into_iter()
                .map(|text| PollOption {
                    id: uuid::Uuid::new_v4().to_string(),
                    text,
                    votes: 0,
                })
                .collect(),
            created_by: draft.created_by,
            status: PollStatus::Active,
            end_date: draft.end_date,
            voted_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_voted(&self, user_id: &str) -> bool {
        self.voted_by.iter().any(|voter| voter == user_id)
    }

    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|option| option.votes).sum()
    }

    /// Overwrites only the fields present in `update`.
    pub fn apply_update(&mut self, update: PollUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone)]
pub struct PollDraft {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub created_by: String,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PollUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PollStatus>,
    pub end_date: Option<DateTime<Utc>>,
}

impl PollUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.end_date.is_none()
    }
}
