// src/handlers/practice.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError,
    extractors::AppJson,
    models::test_result::PracticeSubmitRequest,
    services::scoring::submit_practice,
    store::SharedStore,
    utils::jwt::AuthUser,
};

/// Checks one practice answer and counts it toward the user's practice total.
pub async fn submit(
    State(store): State<SharedStore>,
    Extension(auth): Extension<AuthUser>,
    AppJson(req): AppJson<PracticeSubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = submit_practice(store.as_ref(), auth.user_id, req).await?;

    Ok(Json(submission))
}
