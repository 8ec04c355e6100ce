use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::controllers::auth_controllers::{delete_user, get_users, login, register};
use crate::policy::Action;
use crate::routes::{authenticated, guarded};
use crate::state::AppState;

pub fn auth_routes(state: AppState) -> Router {
    let admin = authenticated(
        &state,
        Router::new()
            .route("/users", guarded(Action::ListUsers, get(get_users::get_users)))
            .route(
                "/users/:id",
                guarded(Action::DeleteUser, delete(delete_user::delete_user)),
            ),
    );

    Router::new()
        .route("/register", post(register::register))
        .route("/login", post(login::login))
        .merge(admin)
        .with_state(state)
}
