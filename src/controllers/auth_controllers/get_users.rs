use axum::{extract::State, Json};

use crate::{
    controllers::auth_controllers::models::UserResponse, state::AppState,
    utils::error::AppResult,
};

pub async fn get_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.users.list().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
