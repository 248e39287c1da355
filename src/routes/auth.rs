use axum::{Router, routing::{post, get, put}, middleware};
use crate::state::AppState;
use crate::handlers::auth::{register, login, me, update_profile};
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));

    let protected = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", put(update_profile))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    open.merge(protected)
}
