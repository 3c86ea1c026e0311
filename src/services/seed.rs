// src/services/seed.rs

use std::path::Path;

use crate::{error::AppError, models::question::NewQuestion, store::QuestionStore};

/// Parses and validates a JSON array of questions.
pub fn parse_questions(raw: &str) -> Result<Vec<NewQuestion>, AppError> {
    let questions: Vec<NewQuestion> = serde_json::from_str(raw)?;
    for (index, question) in questions.iter().enumerate() {
        question
            .check()
            .map_err(|e| AppError::BadRequest(format!("seed question #{}: {}", index, e)))?;
    }
    Ok(questions)
}

/// Inserts the questions from `path` when the question store is empty.
/// Returns how many questions were inserted.
pub async fn seed_questions<S: QuestionStore + ?Sized>(
    store: &S,
    path: &Path,
) -> Result<usize, AppError> {
    if store.count_questions().await? > 0 {
        tracing::info!("Question store already populated, skipping seed.");
        return Ok(0);
    }

    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::InternalServerError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let questions = parse_questions(&raw)?;
    let total = questions.len();

    for question in questions {
        store.insert_question(question).await?;
    }

    tracing::info!("Seeded {} questions from {}", total, path.display());
    Ok(total)
}
