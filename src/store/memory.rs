// src/store/memory.rs

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        question::{NewQuestion, Question},
        test_result::{NewTestResult, TestResult},
        user::{CounterField, MaxField, NewUser, Preferences, User, UserStats},
    },
    services::assembler::sample_without_replacement,
    store::{QuestionStore, ResultStore, StatsLedger, Store, UserStore},
};

/// In-process store for development and tests.
///
/// Every trait method runs inside a single lock acquisition, which gives the
/// same per-operation atomicity as one SQL statement.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    questions: BTreeMap<i64, Question>,
    users: BTreeMap<i64, User>,
    results: Vec<TestResult>,
    last_question_id: i64,
    last_user_id: i64,
    last_result_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn user_mut(inner: &mut Inner, user_id: i64) -> Result<&mut User, AppError> {
    inner
        .users
        .get_mut(&user_id)
        .ok_or(AppError::NotFound("User not found".to_string()))
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn insert_question(&self, question: NewQuestion) -> Result<Question, AppError> {
        let mut inner = self.inner.write().await;
        inner.last_question_id += 1;
        let stored = Question {
            id: inner.last_question_id,
            topic: question.topic,
            text: question.text,
            options: question.options,
            correct_answer: question.correct_answer,
            difficulty: question.difficulty,
            created_at: Utc::now(),
        };
        inner.questions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn count_questions(&self) -> Result<i64, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.questions.len() as i64)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.questions.get(&id).cloned())
    }

    async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.read().await;
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        Ok(wanted
            .iter()
            .filter_map(|id| inner.questions.get(id).cloned())
            .collect())
    }

    async fn list_questions(&self, topic: Option<&str>) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .questions
            .values()
            .filter(|q| topic.is_none_or(|t| q.topic == t))
            .cloned()
            .collect())
    }

    async fn distinct_topics(&self) -> Result<Vec<String>, AppError> {
        let inner = self.inner.read().await;
        let topics: BTreeSet<&str> = inner.questions.values().map(|q| q.topic.as_str()).collect();
        Ok(topics.into_iter().map(str::to_string).collect())
    }

    async fn sample_by_topics(
        &self,
        topics: &[String],
        count: usize,
    ) -> Result<Vec<Question>, AppError> {
        let eligible: Vec<Question> = {
            let inner = self.inner.read().await;
            inner
                .questions
                .values()
                .filter(|q| topics.contains(&q.topic))
                .cloned()
                .collect()
        };
        Ok(sample_without_replacement(eligible, count, &mut rand::rng()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        inner.last_user_id += 1;
        let stored = User {
            id: inner.last_user_id,
            name: user.name,
            email: user.email,
            password: user.password_hash,
            stats: UserStats::default(),
            preferences: Preferences::default(),
            created_at: Utc::now(),
        };
        inner.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert_result(&self, result: NewTestResult) -> Result<TestResult, AppError> {
        let mut inner = self.inner.write().await;
        inner.last_result_id += 1;
        let stored = TestResult {
            id: inner.last_result_id,
            user_id: result.user_id,
            score: result.score,
            time_taken: result.time_taken,
            total_questions: result.total_questions,
            correct_answers: result.correct_answers,
            topics: result.topics,
            results: result.results,
            created_at: Utc::now(),
        };
        inner.results.push(stored.clone());
        Ok(stored)
    }

    async fn list_results(&self, user_id: i64) -> Result<Vec<TestResult>, AppError> {
        let inner = self.inner.read().await;
        let mut results: Vec<TestResult> = inner
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(results)
    }
}

#[async_trait]
impl StatsLedger for MemoryStore {
    async fn increment(
        &self,
        user_id: i64,
        field: CounterField,
        delta: i64,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let stats = &mut user_mut(&mut inner, user_id)?.stats;
        match field {
            CounterField::TestsTaken => stats.tests_taken += delta,
            CounterField::PracticeQuestions => stats.practice_questions += delta,
        }
        Ok(())
    }

    async fn raise_max(
        &self,
        user_id: i64,
        field: MaxField,
        candidate: i64,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let stats = &mut user_mut(&mut inner, user_id)?.stats;
        match field {
            MaxField::BestScore => stats.best_score = stats.best_score.max(candidate),
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::question::Difficulty;

    fn question(topic: &str, n: usize) -> NewQuestion {
        NewQuestion {
            topic: topic.to_string(),
            text: format!("{} question {}", topic, n),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: "A".to_string(),
            difficulty: Difficulty::Medium,
        }
    }

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .insert_user(NewUser {
                name: "Tester".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user(&store, "many@example.com").await.id;

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment(user_id, CounterField::TestsTaken, 1).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reloaded = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(reloaded.stats.tests_taken, 50);
    }

    #[tokio::test]
    async fn test_raise_max_never_decreases() {
        let store = MemoryStore::new();
        let u = user(&store, "max@example.com").await;

        for score in [40, 90, 10, 90, 0] {
            store.raise_max(u.id, MaxField::BestScore, score).await.unwrap();
        }

        let reloaded = store.find_user(u.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stats.best_score, 90);
    }

    #[tokio::test]
    async fn test_ledger_on_unknown_user() {
        let store = MemoryStore::new();
        let err = store
            .increment(404, CounterField::PracticeQuestions, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "dup@example.com").await;
        let err = store
            .insert_user(NewUser {
                name: "Other".to_string(),
                email: "dup@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_topics_are_distinct_and_sorted() {
        let store = MemoryStore::new();
        for topic in ["Physics", "Chemistry", "Physics"] {
            store.insert_question(question(topic, 0)).await.unwrap();
        }
        assert_eq!(
            store.distinct_topics().await.unwrap(),
            vec!["Chemistry".to_string(), "Physics".to_string()]
        );
    }

    #[tokio::test]
    async fn test_sample_stays_within_topics() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store.insert_question(question("Physics", n)).await.unwrap();
            store.insert_question(question("Chemistry", n)).await.unwrap();
        }

        let sample = store
            .sample_by_topics(&["Physics".to_string()], 3)
            .await
            .unwrap();
        assert_eq!(sample.len(), 3);
        assert!(sample.iter().all(|q| q.topic == "Physics"));
    }

    #[tokio::test]
    async fn test_history_is_most_recent_first() {
        let store = MemoryStore::new();
        for score in [10, 20, 30] {
            store
                .insert_result(NewTestResult {
                    user_id: 1,
                    score,
                    time_taken: 5.0,
                    total_questions: 1,
                    correct_answers: 0,
                    topics: vec![],
                    results: vec![],
                })
                .await
                .unwrap();
        }

        let scores: Vec<i64> = store
            .list_results(1)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.score)
            .collect();
        assert_eq!(scores, vec![30, 20, 10]);
    }
}
