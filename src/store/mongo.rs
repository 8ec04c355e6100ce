//! MongoDB stores.
//!
//! Documents are stored with string `_id`s and BSON dates so that expiry can
//! be evaluated inside the vote filter.

use std::future::IntoFuture;
use std::time::Duration;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{PollStore, StoreError, StoreResult, UserStore};
use crate::models::poll_models::{Poll, PollDraft, PollOption, PollStatus, PollUpdate};
use crate::models::user_models::{NewUser, Role, User};
use crate::voting;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            password_hash: doc.password_hash,
            role: doc.role,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PollDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    description: String,
    options: Vec<PollOption>,
    created_by: String,
    status: PollStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    end_date: DateTime<Utc>,
    #[serde(default)]
    voted_by: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<PollDocument> for Poll {
    fn from(doc: PollDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            options: doc.options,
            created_by: doc.created_by,
            status: doc.status,
            end_date: doc.end_date,
            voted_by: doc.voted_by,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<Poll> for PollDocument {
    fn from(poll: Poll) -> Self {
        Self {
            id: poll.id,
            title: poll.title,
            description: poll.description,
            options: poll.options,
            created_by: poll.created_by,
            status: poll.status,
            end_date: poll.end_date,
            voted_by: poll.voted_by,
            created_at: poll.created_at,
            updated_at: poll.updated_at,
        }
    }
}

fn store_error(err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            StoreError::DuplicateEmail
        }
        ErrorKind::BsonDeserialization(e) => StoreError::Corrupt(e.to_string()),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

/// Runs a driver operation with an upper bound on its duration.
async fn bounded<F, T>(timeout: Duration, op: F) -> StoreResult<T>
where
    F: IntoFuture<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(timeout, op.into_future()).await {
        Ok(result) => result.map_err(store_error),
        Err(_) => {
            warn!(?timeout, "store operation timed out");
            Err(StoreError::Timeout(timeout))
        }
    }
}

pub struct MongoUserStore {
    users: Collection<UserDocument>,
    timeout: Duration,
}

impl MongoUserStore {
    /// Opens the `users` collection and ensures the unique email index.
    pub async fn new(db: &Database, timeout: Duration) -> StoreResult<Self> {
        let users = db.collection::<UserDocument>("users");

        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        bounded(timeout, users.create_index(index)).await?;

        Ok(Self { users, timeout })
    }
}

#[async_trait::async_trait]
impl UserStore for MongoUserStore {
    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let doc = UserDocument {
            id: uuid::Uuid::new_v4().to_string(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: Utc::now(),
        };

        bounded(self.timeout, self.users.insert_one(&doc)).await?;
        debug!(user_id = %doc.id, "inserted user document");
        Ok(doc.into())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let found = bounded(self.timeout, self.users.find_one(doc! { "_id": id })).await?;
        Ok(found.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let found = bounded(self.timeout, self.users.find_one(doc! { "email": email })).await?;
        Ok(found.map(User::from))
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let cursor = bounded(
            self.timeout,
            self.users.find(doc! {}).sort(doc! { "created_at": 1 }),
        )
        .await?;
        let docs: Vec<UserDocument> = bounded(self.timeout, cursor.try_collect()).await?;
        Ok(docs.into_iter().map(User::from).collect())
    }

    async fn remove(&self, id: &str) -> StoreResult<User> {
        let filter = doc! { "_id": id, "role": { "$ne": Role::Admin.as_str() } };
        if let Some(removed) = bounded(self.timeout, self.users.find_one_and_delete(filter)).await? {
            return Ok(removed.into());
        }

        match self.find_by_id(id).await? {
            Some(user) if user.is_admin() => Err(StoreError::AdminProtected),
            _ => Err(StoreError::NotFound("User")),
        }
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<u64> {
        bounded(
            self.timeout,
            self.users.count_documents(doc! { "role": role.as_str() }),
        )
        .await
    }
}

pub struct MongoPollStore {
    polls: Collection<PollDocument>,
    timeout: Duration,
}

impl MongoPollStore {
    pub fn new(db: &Database, timeout: Duration) -> Self {
        Self {
            polls: db.collection::<PollDocument>("polls"),
            timeout,
        }
    }

    async fn collect(&self, cursor: mongodb::Cursor<PollDocument>) -> StoreResult<Vec<Poll>> {
        let docs: Vec<PollDocument> = bounded(self.timeout, cursor.try_collect()).await?;
        Ok(docs.into_iter().map(Poll::from).collect())
    }
}

#[async_trait::async_trait]
impl PollStore for MongoPollStore {
    async fn create(&self, draft: PollDraft) -> StoreResult<Poll> {
        let doc = PollDocument::from(Poll::from_draft(draft, Utc::now()));
        bounded(self.timeout, self.polls.insert_one(&doc)).await?;
        Ok(doc.into())
    }

    async fn list(&self) -> StoreResult<Vec<Poll>> {
        let cursor = bounded(
            self.timeout,
            self.polls.find(doc! {}).sort(doc! { "created_at": 1 }),
        )
        .await?;
        self.collect(cursor).await
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<Poll>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let cursor = bounded(
            self.timeout,
            self.polls
                .find(doc! {})
                .sort(doc! { "created_at": -1 })
                .limit(limit),
        )
        .await?;
        self.collect(cursor).await
    }

    async fn get(&self, id: &str) -> StoreResult<Poll> {
        bounded(self.timeout, self.polls.find_one(doc! { "_id": id }))
            .await?
            .map(Poll::from)
            .ok_or(StoreError::NotFound("Poll"))
    }

    async fn update(&self, id: &str, update: PollUpdate) -> StoreResult<Poll> {
        let mut set = Document::new();
        if let Some(title) = update.title {
            set.insert("title", title);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(status) = update.status {
            set.insert("status", status.as_str());
        }
        if let Some(end_date) = update.end_date {
            set.insert("end_date", BsonDateTime::from_chrono(end_date));
        }
        set.insert("updated_at", BsonDateTime::from_chrono(Utc::now()));

        bounded(
            self.timeout,
            self.polls
                .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
                .return_document(ReturnDocument::After),
        )
        .await?
        .map(Poll::from)
        .ok_or(StoreError::NotFound("Poll"))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let result = bounded(self.timeout, self.polls.delete_one(doc! { "_id": id })).await?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound("Poll"));
        }
        Ok(())
    }

    async fn cast_vote(
        &self,
        poll_id: &str,
        option_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Poll> {
        let bson_now = BsonDateTime::from_chrono(now);

        // One document-level update: every acceptance condition is part of
        // the filter, so concurrent attempts serialize on the poll document.
        let filter = doc! {
            "_id": poll_id,
            "status": PollStatus::Active.as_str(),
            "end_date": { "$gte": bson_now },
            "voted_by": { "$ne": user_id },
            "options.id": option_id,
        };
        let update = doc! {
            "$inc": { "options.$[chosen].votes": 1 },
            "$push": { "voted_by": user_id },
            "$set": { "updated_at": bson_now },
        };

        let applied = bounded(
            self.timeout,
            self.polls
                .find_one_and_update(filter, update)
                .array_filters(vec![doc! { "chosen.id": option_id }])
                .return_document(ReturnDocument::After),
        )
        .await?;

        if let Some(doc) = applied {
            return Ok(doc.into());
        }

        // Nothing matched: re-read and let the engine name the rejection.
        let poll = self.get(poll_id).await?;
        voting::check_vote(&poll, option_id, user_id, now)?;
        Err(StoreError::Contended)
    }
}
