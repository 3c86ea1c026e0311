// src/models/test_result.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A graded test submission. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    /// Percentage score, 0..=100.
    pub score: i64,
    /// Seconds spent on the test.
    pub time_taken: f64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub topics: Vec<String>,
    pub results: Vec<QuestionResult>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Per-question outcome. Snapshots the question so history survives later edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: i64,
    /// Question text at submission time.
    pub question: String,
    pub topic: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub options: Vec<String>,
}

/// A graded submission that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTestResult {
    pub user_id: i64,
    pub score: i64,
    pub time_taken: f64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub topics: Vec<String>,
    pub results: Vec<QuestionResult>,
}

/// DTO for requesting a randomized test.
#[derive(Debug, Deserialize, Validate)]
pub struct ForTestRequest {
    #[validate(length(min = 1, message = "At least one topic is required."))]
    pub topics: Vec<String>,
    #[validate(range(min = 1, message = "Count must be positive."))]
    pub count: i64,
}

/// Reference to a question the client was tested on.
/// Any other fields echoed back by the client are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRef {
    #[serde(alias = "_id")]
    pub id: i64,
}

/// DTO for submitting a completed test.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestRequest {
    pub questions: Vec<QuestionRef>,
    /// Positional answers, one per entry in `questions`.
    pub answers: Vec<String>,
    #[validate(range(min = 0.0, message = "Time taken cannot be negative."))]
    pub time_taken: f64,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// DTO for answering a single practice question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSubmitRequest {
    pub question_id: i64,
    pub user_answer: String,
}

/// Outcome of practice grading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeOutcome {
    pub correct: bool,
    pub correct_answer: String,
}
