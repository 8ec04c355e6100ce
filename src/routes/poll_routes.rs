use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::controllers::poll_controllers::{
    cast_vote, create_poll, delete_poll, get_poll, polls, update_poll,
};
use crate::policy::Action;
use crate::routes::{authenticated, guarded};
use crate::state::AppState;

pub fn poll_routes(state: AppState) -> Router {
    let routes = Router::new()
        .route(
            "/",
            guarded(Action::ReadPolls, get(polls::get_all_polls))
                .merge(guarded(Action::CreatePoll, post(create_poll::create_poll))),
        )
        .route(
            "/:id",
            guarded(Action::ReadPolls, get(get_poll::get_poll))
                .merge(guarded(Action::UpdatePoll, put(update_poll::update_poll)))
                .merge(guarded(Action::DeletePoll, delete(delete_poll::delete_poll))),
        )
        .route("/:id/vote", guarded(Action::Vote, post(cast_vote::cast_vote)));

    authenticated(&state, routes).with_state(state)
}
