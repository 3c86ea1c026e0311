// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extractors::AppJson,
    models::user::{LoginRequest, NewUser, RegisterRequest},
    store::SharedStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the user (excluding password) and a token.
pub async fn register(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = store
        .insert_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash: hashed_password,
        })
        .await?;

    tracing::info!("Registered user {}", user.id);

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user,
            "token": token,
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown email and wrong password fail identically so that
/// registered addresses cannot be probed.
pub async fn login(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "user": user,
        "token": token,
    })))
}
