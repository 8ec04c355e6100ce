use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

use crate::policy::Caller;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Resolves the bearer token to a [`Caller`] stored in request extensions.
pub async fn jwt_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(authorization) = bearer
        .ok_or_else(|| AppError::AuthenticationError("Not authorized, no token".to_string()))?;

    let claims = state.sessions.verify_token(authorization.token()).map_err(|e| {
        debug!(error = %e, "rejected bearer token");
        e
    })?;

    let user = state
        .users
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Not authorized, user not found".to_string()))?;

    req.extensions_mut().insert(Caller::from(&user));

    Ok(next.run(req).await)
}
