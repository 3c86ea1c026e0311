// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Issued-at time as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// The identity attached to a request once its token has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

fn now_secs() -> Result<usize, AppError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize)
}

/// Issues a signed token for the user, valid for `expiration_seconds`.
pub fn sign_jwt(user_id: i64, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let now = now_secs()?;
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + expiration_seconds as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies a token and returns the user id it was issued for.
///
/// Bad signature, expiry, or a malformed subject all fail with `Forbidden`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<i64, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Forbidden("Token expired".to_string()),
        _ => AppError::Forbidden("Invalid token".to_string()),
    })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Forbidden("Invalid token subject".to_string()))
}

/// Extracts the token from an `Authorization` value. The scheme is matched
/// case-insensitively, so `bearer <token>` still reaches verification.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

/// Axum Middleware: Authentication.
///
/// Requires an 'Authorization: Bearer <token>' header. A missing header is
/// `Unauthenticated`; a token that fails verification is `Forbidden`.
/// On success an `AuthUser` is inserted into the request extensions.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthenticated("Access token required".to_string()))?;

    let user_id = verify_jwt(token, &config.jwt_secret).inspect_err(|e| {
        tracing::warn!("Token rejected: {}", e);
    })?;

    req.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(req).await)
}
