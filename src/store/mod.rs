//! Storage contracts for users and polls.
//!
//! Two interchangeable backends implement them: [`memory`] (tests, and runs
//! without `MONGO_URI`) and [`mongo`] (durable).

pub mod memory;
pub mod mongo;

use chrono::{DateTime, Utc};

use crate::models::poll_models::{Poll, PollDraft, PollUpdate};
use crate::models::user_models::{NewUser, Role, User};
use crate::voting::VoteError;

pub use memory::{MemoryPollStore, MemoryUserStore};
pub use mongo::{MongoPollStore, MongoUserStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("admin users cannot be deleted")]
    AdminProtected,
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error("store operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("poll changed while the vote was applied")]
    Contended,
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] if the exact email exists.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    /// Deletes a non-admin user and returns it.
    async fn remove(&self, id: &str) -> StoreResult<User>;

    async fn count_by_role(&self, role: Role) -> StoreResult<u64>;
}

#[async_trait::async_trait]
pub trait PollStore: Send + Sync {
    async fn create(&self, draft: PollDraft) -> StoreResult<Poll>;

    /// All polls, oldest first.
    async fn list(&self) -> StoreResult<Vec<Poll>>;

    /// The `limit` most recently created polls, newest first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<Poll>>;

    async fn get(&self, id: &str) -> StoreResult<Poll>;

    async fn update(&self, id: &str, update: PollUpdate) -> StoreResult<Poll>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Applies one vote atomically with respect to every other vote on the
    /// same poll and returns the poll as it stands afterwards.
    async fn cast_vote(
        &self,
        poll_id: &str,
        option_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Poll>;
}
