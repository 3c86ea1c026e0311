// src/handlers/questions.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    extractors::{AppJson, AppQuery},
    models::{question::PublicQuestion, test_result::ForTestRequest},
    services::assembler::assemble_test,
    store::SharedStore,
};

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct ByTopicParams {
    pub topic: Option<String>,
}

/// Lists the distinct topics that have at least one question.
pub async fn list_topics(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let topics = store.distinct_topics().await?;

    Ok(Json(json!({ "topics": topics })))
}

/// Lists questions for study, optionally filtered by topic.
pub async fn list_by_topic(
    State(store): State<SharedStore>,
    AppQuery(params): AppQuery<ByTopicParams>,
) -> Result<impl IntoResponse, AppError> {
    let topic = params.topic.as_deref().filter(|t| !t.is_empty());
    let questions = store.list_questions(topic).await?;

    Ok(Json(json!({ "questions": questions })))
}

/// Builds a randomized test.
/// Answers are stripped because grading happens server-side.
pub async fn for_test(
    State(store): State<SharedStore>,
    AppJson(req): AppJson<ForTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let questions: Vec<PublicQuestion> = assemble_test(store.as_ref(), &req.topics, req.count)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(json!({ "questions": questions })))
}
