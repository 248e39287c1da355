use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::jwt::{role_for, verify_token, Claims, ROLE_ADMIN};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct AuthContext {
    pub employee_id: i64,
    pub role: String,
    pub email: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied. Admin privileges required."))
        }
    }
}

#[derive(Serialize)]
struct ErrorBody { error: String, code: &'static str }

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let auth_header = match req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t.trim(),
        None => return unauthorized("Invalid Authorization format"),
    };

    let claims = match verify_token(token, &state.config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return unauthorized("Token is not valid"),
    };

    // The token only proves identity; admin rights come from the live row.
    let is_admin: Option<bool> = match sqlx::query_scalar("SELECT is_admin FROM employees WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&state.db_pool)
        .await
    {
        Ok(row) => row,
        Err(e) => return AppError::from(e).into_response(),
    };

    let context = match authorize(claims, is_admin) {
        Ok(c) => c,
        Err(response) => return response,
    };
    req.extensions_mut().insert(context);

    next.run(req).await
}

/// Builds the request context from verified claims and the employee's current admin flag.
fn authorize(claims: Claims, is_admin: Option<bool>) -> Result<AuthContext, Response> {
    let is_admin = is_admin.ok_or_else(|| unauthorized("User not found"))?;
    Ok(AuthContext {
        employee_id: claims.sub,
        role: role_for(is_admin).to_string(),
        email: claims.email,
    })
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody { error: msg.to_string(), code: "unauthorized" });
    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{sign_token, ROLE_EMPLOYEE};
    use crate::test_utils::test_state;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt;

    async fn whoami(Extension(auth): Extension<AuthContext>) -> Result<String, AppError> {
        auth.require_admin()?;
        Ok(auth.email)
    }

    fn app() -> Router {
        let state = test_state();
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    fn request(auth: Option<String>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn claims(sub: i64, role: &str) -> Claims {
        let token = sign_token(sub, role, "boss@example.com", "key", 1).unwrap();
        verify_token(&token, "key").unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let response = app().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let response = app().oneshot(request(Some("Basic abc".into()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let response = app().oneshot(request(Some("Bearer not-a-jwt".into()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deleted_employee_is_unauthorized() {
        let response = authorize(claims(7, ROLE_ADMIN), None).unwrap_err();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "User not found");
    }

    #[tokio::test]
    async fn demoted_admin_loses_admin_rights() {
        let context = authorize(claims(7, ROLE_ADMIN), Some(false)).unwrap();
        assert_eq!(context.role, ROLE_EMPLOYEE);
        assert!(!context.is_admin());

        let response = whoami(Extension(context)).await.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn promoted_employee_gains_admin_rights() {
        let context = authorize(claims(8, ROLE_EMPLOYEE), Some(true)).unwrap();
        assert_eq!(context.employee_id, 8);
        assert!(context.is_admin());

        let response = whoami(Extension(context)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
