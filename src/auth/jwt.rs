use chrono::{Utc, Duration};
use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Serialize, Deserialize};
use crate::error::AppError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EMPLOYEE: &str = "employee";

pub fn role_for(is_admin: bool) -> &'static str {
    if is_admin { ROLE_ADMIN } else { ROLE_EMPLOYEE }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn sign_token(
    employee_id: i64,
    role: &str,
    email: &str,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);
    let claims = Claims {
        sub: employee_id,
        email: email.to_string(),
        role: role.to_string(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp().max(0) as usize,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::internal(format!("Token signing failed: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256)
    )
    .map(|d| d.claims)
    .map_err(|e| AppError::unauthorized(format!("Invalid or expired token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_token_verifies_with_same_secret() {
        let token = sign_token(42, ROLE_ADMIN, "boss@example.com", "s3cret", 24).unwrap();
        let claims = verify_token(&token, "s3cret").unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.email, "boss@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_token(1, ROLE_EMPLOYEE, "e@example.com", "one", 1).unwrap();
        assert!(matches!(verify_token(&token, "two"), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign_token(1, ROLE_EMPLOYEE, "e@example.com", "key", -2).unwrap();
        assert!(verify_token(&token, "key").is_err());
    }

    #[test]
    fn role_follows_admin_flag() {
        assert_eq!(role_for(true), "admin");
        assert_eq!(role_for(false), "employee");
    }
}
