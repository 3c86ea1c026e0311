// src/handlers/test_result.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::test_result::SubmitTestRequest,
    services::scoring::submit_test,
    store::SharedStore,
    utils::jwt::AuthUser,
};

/// Submits a completed test.
///
/// * Re-fetches every question by id; client-sent answer keys are ignored.
/// * Grades positionally and stores an immutable result.
/// * Bumps `testsTaken` and raises `bestScore`.
pub async fn submit(
    State(store): State<SharedStore>,
    Extension(auth): Extension<AuthUser>,
    AppJson(req): AppJson<SubmitTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = submit_test(store.as_ref(), auth.user_id, req).await?;

    Ok(Json(outcome))
}

/// Lists the current user's results, most recent first.
pub async fn history(
    State(store): State<SharedStore>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let tests = store.list_results(auth.user_id).await?;

    Ok(Json(json!({ "tests": tests })))
}
