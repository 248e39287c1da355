use axum::{middleware, routing::get, Router};
use crate::handlers::role;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/roles", get(role::list_roles).post(role::create_role))
        .route("/roles/{id}", get(role::get_role).put(role::update_role).delete(role::delete_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
