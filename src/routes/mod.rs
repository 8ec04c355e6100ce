use std::time::Instant;

use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, MethodRouter},
    Router,
};
use once_cell::sync::Lazy;
use serde_json::json;

use crate::middleware::{jwt::jwt_auth, policy::require};
use crate::policy::Action;
use crate::state::AppState;

pub mod auth_routes;
pub mod poll_routes;
pub mod report_routes;

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Attaches the access check for `action` to one method router.
pub(crate) fn guarded(action: Action, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn(require(action)))
}

/// Requires a valid bearer token on every route of `router`.
pub(crate) fn authenticated(state: &AppState, router: Router<AppState>) -> Router<AppState> {
    router.route_layer(from_fn_with_state(state.clone(), jwt_auth))
}

pub fn app(state: AppState) -> Router {
    Lazy::force(&START_TIME);

    Router::new()
        .route("/", get(root))
        .nest("/api/auth", auth_routes::auth_routes(state.clone()))
        .nest("/api/polls", poll_routes::poll_routes(state.clone()))
        .nest("/api/reports", report_routes::report_routes(state))
        .fallback(not_found)
}

async fn root() -> Json<serde_json::Value> {
    let elapsed = START_TIME.elapsed();
    let seconds = elapsed.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let uptime = if days > 0 {
        format!("{}d {}h {}m {}s", days, hours % 24, minutes % 60, seconds % 60)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    };

    Json(json!({
        "status": "ok",
        "message": "Voting System API is running",
        "uptime": uptime
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "NOT_FOUND", "message": "Not Found" })),
    )
}
