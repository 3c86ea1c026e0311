// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{error::AppError, store::SharedStore, utils::jwt::AuthUser};

/// Get current user's profile and statistics.
pub async fn get_profile(
    State(store): State<SharedStore>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user(auth.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": user })))
}
