use axum::{extract::State, Json};
use tracing::debug;

use crate::{
    controllers::auth_controllers::models::{AuthResponse, LoginRequest},
    state::AppState,
    utils::{
        auth::verify_password,
        error::{AppError, AppResult},
        extract::JsonBody,
    },
};

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::AuthenticationError("Invalid email or password".to_string());

    let Some(user) = state.users.find_by_email(&body.email).await? else {
        debug!("login for unknown email");
        return Err(invalid());
    };

    if !verify_password(body.password, user.password_hash.clone()).await? {
        debug!(user_id = %user.id, "login with wrong password");
        return Err(invalid());
    }

    let token = state.sessions.create_token(&user.id)?;

    Ok(Json(AuthResponse::new(user, token)))
}
