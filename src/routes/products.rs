use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use crate::handlers::product::{
    get_products, get_product, create_product, update_product, delete_product,
    get_components, set_component, unset_component, get_product_tree,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/products/{id}/components", get(get_components))
        .route("/products/{id}/components/{component_id}", put(set_component).delete(unset_component))
        .route("/products/{id}/tree", get(get_product_tree))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
