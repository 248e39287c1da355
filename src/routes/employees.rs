use axum::{middleware, routing::get, Router};
use crate::handlers::employee;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

// Writes check for admin inside the handlers
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/employees", get(employee::list_employees).post(employee::create_employee))
        .route(
            "/employees/{id}",
            get(employee::get_employee)
                .put(employee::update_employee)
                .delete(employee::delete_employee),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
