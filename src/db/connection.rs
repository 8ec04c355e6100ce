use mongodb::{options::ClientOptions, Client, Database};
use tracing::info;

use crate::config::Config;
use crate::utils::error::{AppError, AppResult};

pub async fn init_db(mongo_uri: &str, config: &Config) -> AppResult<Database> {
    let mut client_options = ClientOptions::parse(mongo_uri)
        .await
        .map_err(|e| AppError::TransientStoreError(format!("Failed to parse MongoDB URI: {}", e)))?;

    client_options.app_name = Some("VotingSystem".to_string());
    client_options.connect_timeout = Some(config.store_timeout);
    client_options.server_selection_timeout = Some(config.store_timeout);

    let client = Client::with_options(client_options)
        .map_err(|e| AppError::TransientStoreError(format!("Failed to initialize MongoDB client: {}", e)))?;

    info!(db = %config.db_name, "database client ready");

    Ok(client.database(&config.db_name))
}
