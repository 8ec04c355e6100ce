use axum::{routing::get, Router};

use crate::controllers::report_controllers::{feed, summary};
use crate::policy::Action;
use crate::routes::{authenticated, guarded};
use crate::state::AppState;

pub fn report_routes(state: AppState) -> Router {
    let routes = Router::new()
        .route(
            "/summary",
            guarded(Action::ViewSummary, get(summary::get_voting_summary)),
        )
        .route("/feed", guarded(Action::ViewFeed, get(feed::get_poll_feed)));

    authenticated(&state, routes).with_state(state)
}
