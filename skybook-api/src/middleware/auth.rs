use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skybook_core::BookingError;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const CUSTOMER_ROLE: &str = "CUSTOMER";
const ADMIN_ROLES: [&str; 2] = ["ADMIN", "SUPER_ADMIN"];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl CustomerClaims {
    pub fn customer_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl AdminClaims {
    /// Employee id recorded as the author of announcements.
    pub fn employee_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn decode_claims<C: DeserializeOwned>(token: &str, secret: &str) -> Result<C, AppError> {
    decode::<C>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))
}

fn customer_from_token(token: &str, secret: &str) -> Result<CustomerClaims, AppError> {
    let claims: CustomerClaims = decode_claims(token, secret)?;
    if claims.role != CUSTOMER_ROLE {
        return Err(BookingError::Forbidden("customer token required".to_string()).into());
    }
    Ok(claims)
}

/// Customer claims when the request carries a token. A present but invalid token is still
/// rejected.
pub fn optional_customer(headers: &HeaderMap, secret: &str) -> Result<Option<CustomerClaims>, AppError> {
    if !headers.contains_key("Authorization") {
        return Ok(None);
    }
    let token = bearer_token(headers).ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))?;
    customer_from_token(token, secret).map(Some)
}

pub fn require_customer(headers: &HeaderMap, secret: &str) -> Result<CustomerClaims, AppError> {
    let token = bearer_token(headers).ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    customer_from_token(token, secret)
}

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = require_customer(req.headers(), &state.auth.secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    let claims: AdminClaims = decode_claims(token, &state.auth.secret)?;

    if !ADMIN_ROLES.contains(&claims.role.as_str()) {
        return Err(BookingError::Forbidden("employee token required".to_string()).into());
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
