//! Persistence traits consumed by the grading core.
//!
//! Every method is a single atomic store operation. Callers that need several
//! of them (persist a result, then update the ledger) get no transaction
//! around the sequence.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::Config,
    error::AppError,
    models::{
        question::{NewQuestion, Question},
        test_result::{NewTestResult, TestResult},
        user::{CounterField, MaxField, NewUser, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle injected into handlers through `AppState`.
pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn insert_question(&self, question: NewQuestion) -> Result<Question, AppError>;

    async fn count_questions(&self) -> Result<i64, AppError>;

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Looks up several questions. Unknown ids are simply absent from the output.
    async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<Question>, AppError>;

    /// All questions, or only those of `topic` when given.
    async fn list_questions(&self, topic: Option<&str>) -> Result<Vec<Question>, AppError>;

    /// Distinct topic names, sorted.
    async fn distinct_topics(&self) -> Result<Vec<String>, AppError>;

    /// Uniform random sample without replacement of up to `count` questions
    /// whose topic is in `topics`.
    async fn sample_by_topics(
        &self,
        topics: &[String],
        count: usize,
    ) -> Result<Vec<Question>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn insert_result(&self, result: NewTestResult) -> Result<TestResult, AppError>;

    /// A user's results, most recent first.
    async fn list_results(&self, user_id: i64) -> Result<Vec<TestResult>, AppError>;
}

/// Per-user statistics. Mutations are atomic and commutative so concurrent
/// submissions from one user never lose updates.
#[async_trait]
pub trait StatsLedger: Send + Sync {
    async fn increment(&self, user_id: i64, field: CounterField, delta: i64)
    -> Result<(), AppError>;

    /// Sets `field = max(field, candidate)`.
    async fn raise_max(&self, user_id: i64, field: MaxField, candidate: i64)
    -> Result<(), AppError>;
}

#[async_trait]
pub trait Store: QuestionStore + UserStore + ResultStore + StatsLedger {
    /// Releases connections on shutdown.
    async fn close(&self);
}

/// Opens the store selected by configuration.
pub async fn connect(config: &Config) -> Result<SharedStore, AppError> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
