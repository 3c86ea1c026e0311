// src/store/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions, types::Json};

use crate::{
    error::AppError,
    models::{
        question::{NewQuestion, Question},
        test_result::{NewTestResult, QuestionResult, TestResult},
        user::{CounterField, MaxField, NewUser, Preferences, User, UserStats},
    },
    store::{QuestionStore, ResultStore, StatsLedger, Store, UserStore},
};

const CONNECT_RETRIES: u32 = 5;

/// Postgres-backed store. Each method maps to exactly one SQL statement.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    topic: String,
    text: String,
    options: Json<Vec<String>>,
    correct_answer: String,
    difficulty: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            topic: row.topic,
            text: row.text,
            options: row.options.0,
            correct_answer: row.correct_answer,
            difficulty: row.difficulty.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    tests_taken: i64,
    practice_questions: i64,
    average_score: f64,
    best_score: i64,
    study_streak: i64,
    theme: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            stats: UserStats {
                tests_taken: row.tests_taken,
                practice_questions: row.practice_questions,
                average_score: row.average_score,
                best_score: row.best_score,
                study_streak: row.study_streak,
            },
            preferences: Preferences { theme: row.theme },
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct TestResultRow {
    id: i64,
    user_id: i64,
    score: i64,
    time_taken: f64,
    total_questions: i64,
    correct_answers: i64,
    topics: Json<Vec<String>>,
    results: Json<Vec<QuestionResult>>,
    created_at: DateTime<Utc>,
}

impl From<TestResultRow> for TestResult {
    fn from(row: TestResultRow) -> Self {
        TestResult {
            id: row.id,
            user_id: row.user_id,
            score: row.score,
            time_taken: row.time_taken,
            total_questions: row.total_questions,
            correct_answers: row.correct_answers,
            topics: row.topics.0,
            results: row.results.0,
            created_at: row.created_at,
        }
    }
}

const QUESTION_COLUMNS: &str = "id, topic, text, options, correct_answer, difficulty, created_at";

const USER_COLUMNS: &str = "id, name, email, password, tests_taken, practice_questions, \
     average_score, best_score, study_streak, theme, created_at";

const RESULT_COLUMNS: &str = "id, user_id, score, time_taken, total_questions, correct_answers, \
     topics, results, created_at";

impl PgStore {
    /// Connects with retry, then applies the embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > CONNECT_RETRIES {
                        return Err(AppError::StoreError(format!(
                            "failed to connect to database after {} retries: {}",
                            CONNECT_RETRIES, e
                        )));
                    }
                    tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };

        tracing::info!("Database connected...");

        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::StoreError(format!("failed to run migrations: {}", e)))?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self { pool })
    }
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn insert_question(&self, question: NewQuestion) -> Result<Question, AppError> {
        let sql = format!(
            "INSERT INTO questions (topic, text, options, correct_answer, difficulty) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            QUESTION_COLUMNS
        );
        let row: QuestionRow = sqlx::query_as(&sql)
            .bind(&question.topic)
            .bind(&question.text)
            .bind(Json(&question.options))
            .bind(&question.correct_answer)
            .bind(question.difficulty.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn count_questions(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {} FROM questions WHERE id = $1", QUESTION_COLUMNS);
        let row: Option<QuestionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Question::try_from).transpose()
    }

    async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<Question>, AppError> {
        let sql = format!("SELECT {} FROM questions WHERE id = ANY($1)", QUESTION_COLUMNS);
        let rows: Vec<QuestionRow> = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn list_questions(&self, topic: Option<&str>) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {} FROM questions WHERE ($1::TEXT IS NULL OR topic = $1) ORDER BY id",
            QUESTION_COLUMNS
        );
        let rows: Vec<QuestionRow> = sqlx::query_as(&sql)
            .bind(topic)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn distinct_topics(&self) -> Result<Vec<String>, AppError> {
        let topics: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT topic FROM questions ORDER BY topic")
                .fetch_all(&self.pool)
                .await?;
        Ok(topics.into_iter().map(|(topic,)| topic).collect())
    }

    async fn sample_by_topics(
        &self,
        topics: &[String],
        count: usize,
    ) -> Result<Vec<Question>, AppError> {
        // ORDER BY RANDOM() gives every eligible row the same chance and never repeats one.
        let sql = format!(
            "SELECT {} FROM questions WHERE topic = ANY($1) ORDER BY RANDOM() LIMIT $2",
            QUESTION_COLUMNS
        );
        let limit = i64::try_from(count).unwrap_or(i64::MAX);
        let rows: Vec<QuestionRow> = sqlx::query_as(&sql)
            .bind(topics)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to sample questions: {:?}", e);
                AppError::from(e)
            })?;

        rows.into_iter().map(Question::try_from).collect()
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return AppError::Conflict(format!(
                            "Email '{}' is already registered",
                            user.email
                        ));
                    }
                }
                tracing::error!("Failed to register user: {:?}", e);
                AppError::from(e)
            })?;

        Ok(row.into())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn insert_result(&self, result: NewTestResult) -> Result<TestResult, AppError> {
        let sql = format!(
            "INSERT INTO test_results \
             (user_id, score, time_taken, total_questions, correct_answers, topics, results) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            RESULT_COLUMNS
        );
        let row: TestResultRow = sqlx::query_as(&sql)
            .bind(result.user_id)
            .bind(result.score)
            .bind(result.time_taken)
            .bind(result.total_questions)
            .bind(result.correct_answers)
            .bind(Json(&result.topics))
            .bind(Json(&result.results))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert test result: {:?}", e);
                AppError::from(e)
            })?;

        Ok(row.into())
    }

    async fn list_results(&self, user_id: i64) -> Result<Vec<TestResult>, AppError> {
        let sql = format!(
            "SELECT {} FROM test_results WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            RESULT_COLUMNS
        );
        let rows: Vec<TestResultRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(TestResult::from).collect())
    }
}

#[async_trait]
impl StatsLedger for PgStore {
    async fn increment(
        &self,
        user_id: i64,
        field: CounterField,
        delta: i64,
    ) -> Result<(), AppError> {
        // Column names come from a closed enum, never from input.
        let sql = format!(
            "UPDATE users SET {col} = {col} + $1 WHERE id = $2",
            col = field.column()
        );
        let done = sqlx::query(&sql)
            .bind(delta)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn raise_max(
        &self,
        user_id: i64,
        field: MaxField,
        candidate: i64,
    ) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE users SET {col} = GREATEST({col}, $1) WHERE id = $2",
            col = field.column()
        );
        let done = sqlx::query(&sql)
            .bind(candidate)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn close(&self) {
        self.pool.close().await;
    }
}
