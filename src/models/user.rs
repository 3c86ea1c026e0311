// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A registered user and the ledger of their statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,

    /// Unique email address, used as the login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub stats: UserStats,
    pub preferences: Preferences,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Derived counters, mutated only through the stats ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub tests_taken: i64,
    pub practice_questions: i64,
    /// Not maintained by the grading path.
    pub average_score: f64,
    pub best_score: i64,
    /// Not maintained by the grading path.
    pub study_streak: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
        }
    }
}

/// Ledger counters that only ever grow by a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    TestsTaken,
    PracticeQuestions,
}

impl CounterField {
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::TestsTaken => "tests_taken",
            CounterField::PracticeQuestions => "practice_questions",
        }
    }
}

/// Ledger fields that track a running maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxField {
    BestScore,
}

impl MaxField {
    pub fn column(&self) -> &'static str {
        match self {
            MaxField::BestScore => "best_score",
        }
    }
}

/// Data needed to create a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
