//! In-memory stores backed by `DashMap`.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::{PollStore, StoreError, StoreResult, UserStore};
use crate::models::poll_models::{Poll, PollDraft, PollUpdate};
use crate::models::user_models::{NewUser, Role, User};
use crate::voting;

#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, User>,
    /// email -> user id
    emails: DashMap<String, String>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: Utc::now(),
        };

        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                debug!(user_id = %user.id, "stored user in memory");
                Ok(user)
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.get(id).map(|user| user.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(id) = self.emails.get(email).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|user| user.value().clone()).collect();
        users.sort_by_key(|user| user.created_at);
        Ok(users)
    }

    async fn remove(&self, id: &str) -> StoreResult<User> {
        let Some(user) = self.users.get(id).map(|user| user.value().clone()) else {
            return Err(StoreError::NotFound("User"));
        };
        if user.is_admin() {
            return Err(StoreError::AdminProtected);
        }

        let (_, removed) = self
            .users
            .remove_if(id, |_, user| !user.is_admin())
            .ok_or(StoreError::NotFound("User"))?;
        self.emails.remove(&removed.email);
        Ok(removed)
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<u64> {
        Ok(self.users.iter().filter(|user| user.role == role).count() as u64)
    }
}

#[derive(Default)]
pub struct MemoryPollStore {
    polls: DashMap<String, Poll>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Vec<Poll> {
        self.polls.iter().map(|poll| poll.value().clone()).collect()
    }
}

#[async_trait::async_trait]
impl PollStore for MemoryPollStore {
    async fn create(&self, draft: PollDraft) -> StoreResult<Poll> {
        let poll = Poll::from_draft(draft, Utc::now());
        self.polls.insert(poll.id.clone(), poll.clone());
        Ok(poll)
    }

    async fn list(&self) -> StoreResult<Vec<Poll>> {
        let mut polls = self.snapshot();
        polls.sort_by_key(|poll| poll.created_at);
        Ok(polls)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<Poll>> {
        let mut polls = self.snapshot();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        polls.truncate(limit);
        Ok(polls)
    }

    async fn get(&self, id: &str) -> StoreResult<Poll> {
        self.polls
            .get(id)
            .map(|poll| poll.value().clone())
            .ok_or(StoreError::NotFound("Poll"))
    }

    async fn update(&self, id: &str, update: PollUpdate) -> StoreResult<Poll> {
        let mut poll = self.polls.get_mut(id).ok_or(StoreError::NotFound("Poll"))?;
        poll.value_mut().apply_update(update, Utc::now());
        Ok(poll.value().clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.polls
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("Poll"))
    }

    async fn cast_vote(
        &self,
        poll_id: &str,
        option_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Poll> {
        // The entry guard holds the shard write lock, so check and mutation
        // happen under one exclusive scope for this poll.
        let mut poll = self.polls.get_mut(poll_id).ok_or(StoreError::NotFound("Poll"))?;
        voting::apply_vote(poll.value_mut(), option_id, user_id, now)?;
        Ok(poll.value().clone())
    }
}
