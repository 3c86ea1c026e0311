// src/models/question.rs

use std::{collections::HashSet, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Number of options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(AppError::StoreError(format!("unknown difficulty '{}'", other))),
        }
    }
}

/// A stored multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub topic: String,

    /// The question prompt.
    pub text: String,

    /// Exactly four distinct options, in display order.
    pub options: Vec<String>,

    /// Always equal to one of `options`.
    pub correct_answer: String,

    pub difficulty: Difficulty,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a test question to the client (excludes the answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub topic: String,
    pub text: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            topic: q.topic,
            text: q.text,
            options: q.options,
            difficulty: q.difficulty,
        }
    }
}

/// DTO for creating a new question (seeding).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl NewQuestion {
    /// Field validation plus the cross-field rule that the answer is one of the options.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if !self.options.contains(&self.correct_answer) {
            return Err(AppError::BadRequest(format!(
                "correct answer '{}' is not one of the options",
                self.correct_answer
            )));
        }
        Ok(())
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != OPTIONS_PER_QUESTION {
        return Err(validator::ValidationError::new("options_must_have_four_entries"));
    }
    let mut seen = HashSet::new();
    for opt in options {
        if opt.is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
        if !seen.insert(opt.as_str()) {
            return Err(validator::ValidationError::new("options_must_be_unique"));
        }
    }
    Ok(())
}
