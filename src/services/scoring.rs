// src/services/scoring.rs

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::Question,
        test_result::{
            NewTestResult, PracticeOutcome, PracticeSubmitRequest, QuestionResult,
            SubmitTestRequest, TestResult,
        },
        user::{CounterField, MaxField},
    },
    store::Store,
};

/// A stored result plus whether the ledger update that followed it succeeded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub result: TestResult,
    pub stats_updated: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSubmission {
    #[serde(flatten)]
    pub outcome: PracticeOutcome,
    pub stats_updated: bool,
}

/// Percentage of correct answers, rounded half up.
///
/// Integer arithmetic: floor((200 * correct + total) / (2 * total)).
pub fn compute_score(correct: usize, total: usize) -> Result<i64, AppError> {
    if total == 0 {
        return Err(AppError::empty_question_set());
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    Ok(((200 * correct + total) / (2 * total)) as i64)
}

/// Grades answers positionally against `questions`.
///
/// Answers are compared with exact string equality. No trimming or case folding.
pub fn grade_submission(
    questions: &[Question],
    answers: &[String],
    time_taken: f64,
    topics: &[String],
    user_id: i64,
) -> Result<NewTestResult, AppError> {
    if questions.is_empty() {
        return Err(AppError::empty_question_set());
    }
    if answers.len() != questions.len() {
        return Err(AppError::BadRequest(format!(
            "Expected {} answers, got {}",
            questions.len(),
            answers.len()
        )));
    }
    if !time_taken.is_finite() || time_taken < 0.0 {
        return Err(AppError::BadRequest("Time taken cannot be negative.".to_string()));
    }

    let results: Vec<QuestionResult> = questions
        .iter()
        .zip(answers)
        .map(|(question, answer)| QuestionResult {
            question_id: question.id,
            question: question.text.clone(),
            topic: question.topic.clone(),
            user_answer: answer.clone(),
            correct_answer: question.correct_answer.clone(),
            is_correct: *answer == question.correct_answer,
            options: question.options.clone(),
        })
        .collect();

    let correct_answers = results.iter().filter(|r| r.is_correct).count();
    let score = compute_score(correct_answers, questions.len())?;

    let topics: BTreeSet<String> = if topics.is_empty() {
        questions.iter().map(|q| q.topic.clone()).collect()
    } else {
        topics.iter().cloned().collect()
    };

    Ok(NewTestResult {
        user_id,
        score,
        time_taken,
        total_questions: questions.len() as i64,
        correct_answers: correct_answers as i64,
        topics: topics.into_iter().collect(),
        results,
    })
}

/// One-question grading used by practice mode.
pub fn grade_practice(question: &Question, answer: &str) -> PracticeOutcome {
    PracticeOutcome {
        correct: answer == question.correct_answer,
        correct_answer: question.correct_answer.clone(),
    }
}

/// Grades a submitted test against authoritative question data, stores the
/// result, then updates the user's ledger.
///
/// A ledger failure after the result is stored is logged and reported through
/// `stats_updated`; the stored result is kept.
pub async fn submit_test<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    req: SubmitTestRequest,
) -> Result<SubmissionOutcome, AppError> {
    req.validate()?;
    ensure_user(store, user_id).await?;

    let ids: Vec<i64> = req.questions.iter().map(|q| q.id).collect();
    let questions = load_questions(store, &ids).await?;

    let graded = grade_submission(&questions, &req.answers, req.time_taken, &req.topics, user_id)?;
    let result = store.insert_result(graded).await?;

    tracing::info!(
        "User {} scored {} ({}/{})",
        user_id,
        result.score,
        result.correct_answers,
        result.total_questions
    );

    let stats_updated = match record_test(store, user_id, result.score).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                "Stats update failed after storing result {} for user {}: {}",
                result.id,
                user_id,
                e
            );
            false
        }
    };

    Ok(SubmissionOutcome {
        result,
        stats_updated,
    })
}

/// Grades a single practice answer and counts it in the ledger.
pub async fn submit_practice<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    req: PracticeSubmitRequest,
) -> Result<PracticeSubmission, AppError> {
    ensure_user(store, user_id).await?;

    let question = store
        .find_question(req.question_id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let outcome = grade_practice(&question, &req.user_answer);

    let stats_updated = match store
        .increment(user_id, CounterField::PracticeQuestions, 1)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Practice stats update failed for user {}: {}", user_id, e);
            false
        }
    };

    Ok(PracticeSubmission {
        outcome,
        stats_updated,
    })
}

async fn record_test<S: Store + ?Sized>(store: &S, user_id: i64, score: i64) -> Result<(), AppError> {
    store.increment(user_id, CounterField::TestsTaken, 1).await?;
    store.raise_max(user_id, MaxField::BestScore, score).await
}

async fn ensure_user<S: Store + ?Sized>(store: &S, user_id: i64) -> Result<(), AppError> {
    store
        .find_user(user_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Fetches questions by id, preserving the submitted order.
async fn load_questions<S: Store + ?Sized>(store: &S, ids: &[i64]) -> Result<Vec<Question>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let by_id: HashMap<i64, Question> = store
        .find_questions_by_ids(ids)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    ids.iter()
        .map(|id| {
            by_id
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Question {} not found", id)))
        })
        .collect()
}
