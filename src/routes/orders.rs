use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use crate::handlers::order;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/orders", get(order::list_orders).post(order::create_order))
        .route("/orders/{id}", get(order::get_order).put(order::update_order).delete(order::delete_order))
        .route("/orders/{id}/products", get(order::get_order_lines))
        .route("/orders/{id}/products/{product_id}", put(order::set_order_line).delete(order::unset_order_line))
        .route("/orders/{id}/valuation", get(order::get_order_valuation))
        .route("/orders/{id}/cost-breakdown", get(order::get_cost_breakdown))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
