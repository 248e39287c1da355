pub mod auth;
pub mod employees;
pub mod orders;
pub mod products;
pub mod roles;

use axum::{routing::get, Router};
use crate::state::AppState;

pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "MCPE API" }))
        .route("/health", get(health_check))
        .merge(auth::routes(state))
        .merge(employees::routes(state))
        .merge(roles::routes(state))
        .merge(products::routes(state))
        .merge(orders::routes(state))
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = test_state();
        create_router(&state).with_state(state)
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_open() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn resource_routes_require_a_token() {
        for (method, uri) in [
            ("GET", "/products"),
            ("GET", "/products/1/tree"),
            ("PUT", "/products/1/components/2"),
            ("GET", "/orders"),
            ("GET", "/orders/1/valuation"),
            ("GET", "/orders/1/cost-breakdown"),
            ("GET", "/employees"),
            ("DELETE", "/roles/3"),
            ("GET", "/auth/me"),
        ] {
            assert_eq!(status_of(method, uri).await, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        assert_eq!(status_of("GET", "/invoices").await, StatusCode::NOT_FOUND);
    }
}
