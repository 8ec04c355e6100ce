use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::{
    controllers::auth_controllers::models::{AuthResponse, RegisterRequest},
    models::user_models::NewUser,
    state::AppState,
    utils::{
        auth::hash_password,
        error::{AppError, AppResult},
        extract::JsonBody,
    },
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::ValidationError("Name is required".to_string()));
    }

    if body.email.is_empty() || !body.email.contains('@') {
        return Err(AppError::ValidationError("A valid email is required".to_string()));
    }

    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    if state.users.find_by_email(&body.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(body.password, state.config.bcrypt_cost).await?;

    // The store re-checks uniqueness, covering concurrent registrations.
    let user = state
        .users
        .create(NewUser {
            name,
            email: body.email,
            password_hash,
            role: body.role.unwrap_or_default(),
        })
        .await?;

    let token = state.sessions.create_token(&user.id)?;

    info!(user_id = %user.id, role = user.role.as_str(), "user registered");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}
