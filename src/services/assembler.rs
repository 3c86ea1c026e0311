// src/services/assembler.rs

use std::collections::BTreeSet;

use rand::{Rng, seq::SliceRandom};

use crate::{error::AppError, models::question::Question, store::QuestionStore};

/// Builds a randomized test from the requested topics.
///
/// Returns `min(count, eligible)` distinct questions; a short result is not an error.
pub async fn assemble_test<S: QuestionStore + ?Sized>(
    store: &S,
    topics: &[String],
    count: i64,
) -> Result<Vec<Question>, AppError> {
    let topics: Vec<String> = topics
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    if topics.is_empty() {
        return Err(AppError::BadRequest("At least one topic is required.".to_string()));
    }
    if count <= 0 {
        return Err(AppError::BadRequest("Count must be positive.".to_string()));
    }

    let count = usize::try_from(count).unwrap_or(usize::MAX);
    let questions = store.sample_by_topics(&topics, count).await?;

    tracing::debug!(
        "Assembled test with {} of {} requested questions for topics {:?}",
        questions.len(),
        count,
        topics
    );

    Ok(questions)
}

/// Uniform sample without replacement, in random order (Fisher-Yates).
pub fn sample_without_replacement<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    count: usize,
    rng: &mut R,
) -> Vec<T> {
    items.shuffle(rng);
    items.truncate(count);
    items
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        models::question::{Difficulty, NewQuestion},
        store::MemoryStore,
    };

    async fn seeded_store(topics: &[(&str, usize)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (topic, n) in topics {
            for i in 0..*n {
                store
                    .insert_question(NewQuestion {
                        topic: topic.to_string(),
                        text: format!("{} #{}", topic, i),
                        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                        correct_answer: "A".to_string(),
                        difficulty: Difficulty::Easy,
                    })
                    .await
                    .unwrap();
            }
        }
        store
    }

    #[test]
    fn test_sample_has_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(7);
        let sample = sample_without_replacement((0..100).collect(), 30, &mut rng);
        let unique: HashSet<_> = sample.iter().collect();
        assert_eq!(sample.len(), 30);
        assert_eq!(unique.len(), 30);
    }

    #[test]
    fn test_sample_larger_than_pool_returns_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sample = sample_without_replacement(vec![1, 2, 3], 10, &mut rng);
        sample.sort();
        assert_eq!(sample, vec![1, 2, 3]);
    }

    #[test]
    fn test_sample_is_not_biased_toward_insertion_order() {
        // Each of 10 items should be picked roughly 3/10 of the time.
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits: HashMap<u32, u32> = HashMap::new();
        let rounds = 20_000;
        for _ in 0..rounds {
            for item in sample_without_replacement((0..10).collect::<Vec<u32>>(), 3, &mut rng) {
                *hits.entry(item).or_default() += 1;
            }
        }

        let expected = rounds as f64 * 0.3;
        for item in 0..10 {
            let observed = hits[&item] as f64;
            assert!(
                (observed - expected).abs() < expected * 0.05,
                "item {} picked {} times, expected about {}",
                item,
                observed,
                expected
            );
        }
    }

    #[tokio::test]
    async fn test_returns_available_when_fewer_than_requested() {
        let store = seeded_store(&[("Physics", 2), ("Chemistry", 5)]).await;

        let questions = assemble_test(&store, &["Physics".to_string()], 5).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.topic == "Physics"));
    }

    #[tokio::test]
    async fn test_order_varies_across_calls() {
        let store = seeded_store(&[("Physics", 6)]).await;

        let mut orders = HashSet::new();
        for _ in 0..50 {
            let ids: Vec<i64> = assemble_test(&store, &["Physics".to_string()], 6)
                .await
                .unwrap()
                .iter()
                .map(|q| q.id)
                .collect();
            orders.insert(ids);
        }
        assert!(orders.len() > 1);
    }

    #[tokio::test]
    async fn test_mixed_topics_without_duplicates() {
        let store = seeded_store(&[("Physics", 4), ("Chemistry", 4), ("Mathematics", 4)]).await;
        let topics = vec!["Physics".to_string(), "Chemistry".to_string()];

        let questions = assemble_test(&store, &topics, 6).await.unwrap();
        let ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();
        assert_eq!(questions.len(), 6);
        assert_eq!(ids.len(), 6);
        assert!(questions.iter().all(|q| q.topic != "Mathematics"));
    }

    #[tokio::test]
    async fn test_rejects_empty_topics_and_bad_count() {
        let store = seeded_store(&[("Physics", 2)]).await;

        assert!(matches!(
            assemble_test(&store, &[], 5).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            assemble_test(&store, &["Physics".to_string()], 0).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
