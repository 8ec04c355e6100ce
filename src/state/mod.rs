use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::db;
use crate::store::{
    MemoryPollStore, MemoryUserStore, MongoPollStore, MongoUserStore, PollStore, UserStore,
};
use crate::utils::error::AppResult;
use crate::utils::session::SessionKeys;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub polls: Arc<dyn PollStore>,
    pub sessions: Arc<SessionKeys>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, polls: Arc<dyn PollStore>, config: Config) -> Self {
        let sessions = SessionKeys::new(&config.jwt_secret, config.token_ttl);
        Self {
            users,
            polls,
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        }
    }

    pub fn in_memory(config: Config) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryPollStore::new()),
            config,
        )
    }

    /// Picks the durable store when `MONGO_URI` is configured.
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let Some(mongo_uri) = config.mongo_uri.clone() else {
            info!("MONGO_URI not set, using in-memory store");
            return Ok(Self::in_memory(config));
        };

        let database = db::connection::init_db(&mongo_uri, &config).await?;
        let users = MongoUserStore::new(&database, config.store_timeout).await?;
        let polls = MongoPollStore::new(&database, config.store_timeout);

        Ok(Self::new(Arc::new(users), Arc::new(polls), config))
    }
}
