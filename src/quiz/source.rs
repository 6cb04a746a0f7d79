// src/quiz/source.rs

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{Difficulty, Question},
};

/// Draws `min(count, matches)` questions uniformly at random without
/// replacement from the questions matching `category` and `difficulty`
/// exactly. Returns an empty list when nothing matches.
pub fn select<R: Rng + ?Sized>(
    pool: &[Question],
    category: &str,
    difficulty: Difficulty,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut matching: Vec<&Question> = pool
        .iter()
        .filter(|q| q.category == category && q.difficulty == difficulty)
        .collect();

    matching.shuffle(rng);
    matching.truncate(count);
    matching.into_iter().cloned().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BankStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
}

/// The question pool the shell draws quizzes from.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Keeps only questions that pass validation.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        let questions = questions
            .into_iter()
            .filter(|q| match q.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Skipping invalid question '{}': {}", q.prompt, e);
                    false
                }
            })
            .collect();
        Self { questions }
    }

    /// Loads a JSON array of questions. Entries that do not parse or
    /// validate are skipped with a warning instead of failing the whole bank.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!("Failed to read question bank {}: {:?}", path.display(), e);
            AppError::from(e)
        })?;

        let raw: Vec<serde_json::Value> = serde_json::from_str(&content)?;
        let mut questions = Vec::with_capacity(raw.len());
        for (i, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<Question>(value) {
                Ok(q) => questions.push(q),
                Err(e) => tracing::warn!("Skipping malformed question #{}: {}", i, e),
            }
        }

        let bank = Self::from_questions(questions);
        tracing::info!(
            "Loaded {} questions from {}",
            bank.questions.len(),
            path.display()
        );
        Ok(bank)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// `None` means "any".
    pub fn filter(&self, category: Option<&str>, difficulty: Option<Difficulty>) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| category.is_none_or(|c| q.category == c))
            .filter(|q| difficulty.is_none_or(|d| q.difficulty == d))
            .collect()
    }

    pub fn count(&self, category: Option<&str>, difficulty: Option<Difficulty>) -> usize {
        self.filter(category, difficulty).len()
    }

    /// Unique categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.questions.iter().map(|q| q.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn difficulties(&self) -> [Difficulty; 3] {
        Difficulty::ALL
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        category: &str,
        difficulty: Difficulty,
        count: usize,
        rng: &mut R,
    ) -> Vec<Question> {
        select(&self.questions, category, difficulty, count, rng)
    }

    /// Roughly 40% Easy, 40% Medium and the rest Hard, shuffled together.
    /// Short buckets are not topped up from the others.
    pub fn select_mixed<R: Rng + ?Sized>(
        &self,
        category: &str,
        count: usize,
        rng: &mut R,
    ) -> Vec<Question> {
        let easy_count = count * 2 / 5;
        let medium_count = count * 2 / 5;
        let hard_count = count - easy_count - medium_count;

        let mut mixed = Vec::with_capacity(count);
        mixed.extend(self.select(category, Difficulty::Easy, easy_count, rng));
        mixed.extend(self.select(category, Difficulty::Medium, medium_count, rng));
        mixed.extend(self.select(category, Difficulty::Hard, hard_count, rng));

        mixed.shuffle(rng);
        mixed.truncate(count);
        mixed
    }

    pub fn stats(&self) -> BankStats {
        let mut stats = BankStats {
            total: self.questions.len(),
            ..Default::default()
        };
        for q in &self.questions {
            *stats.by_category.entry(q.category.clone()).or_default() += 1;
            *stats.by_difficulty.entry(q.difficulty).or_default() += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn question(category: &str, difficulty: Difficulty, n: usize) -> Question {
        Question::new(
            category,
            difficulty,
            format!("{} {} #{}", category, difficulty, n),
            ["a", "b", "c", "d"],
            n % 4,
            "",
        )
        .unwrap()
    }

    fn sample_pool() -> Vec<Question> {
        let mut pool = Vec::new();
        for n in 0..8 {
            pool.push(question("Science", Difficulty::Easy, n));
        }
        for n in 0..3 {
            pool.push(question("Science", Difficulty::Hard, n));
            pool.push(question("History", Difficulty::Easy, n));
        }
        pool
    }

    #[test]
    fn test_select_no_duplicates_and_capped() {
        let pool = sample_pool();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let picked = select(&pool, "Science", Difficulty::Easy, 5, &mut rng);
            assert_eq!(picked.len(), 5);
            let prompts: HashSet<_> = picked.iter().map(|q| q.prompt.clone()).collect();
            assert_eq!(prompts.len(), 5);
            assert!(picked
                .iter()
                .all(|q| q.category == "Science" && q.difficulty == Difficulty::Easy));
        }
    }

    #[test]
    fn test_select_returns_fewer_only_when_pool_short() {
        let pool = sample_pool();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select(&pool, "Science", Difficulty::Hard, 10, &mut rng).len(), 3);
        assert!(select(&pool, "Science", Difficulty::Medium, 10, &mut rng).is_empty());
        assert!(select(&pool, "Art", Difficulty::Easy, 10, &mut rng).is_empty());
    }

    #[test]
    fn test_select_is_deterministic_for_seed() {
        let pool = sample_pool();
        let a = select(&pool, "Science", Difficulty::Easy, 4, &mut StdRng::seed_from_u64(42));
        let b = select(&pool, "Science", Difficulty::Easy, 4, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_bank_queries() {
        let bank = QuestionBank::from_questions(sample_pool());
        assert_eq!(bank.categories(), vec!["History".to_string(), "Science".to_string()]);
        assert_eq!(bank.count(Some("Science"), None), 11);
        assert_eq!(bank.count(None, Some(Difficulty::Easy)), 11);
        assert_eq!(bank.count(None, None), 14);

        let stats = bank.stats();
        assert_eq!(stats.total, 14);
        assert_eq!(stats.by_category["History"], 3);
        assert_eq!(stats.by_difficulty[&Difficulty::Hard], 3);
    }

    #[test]
    fn test_select_mixed_respects_buckets() {
        let bank = QuestionBank::from_questions(sample_pool());
        let mut rng = StdRng::seed_from_u64(3);
        // 10 -> 4 easy, 4 medium (none available), 2 hard
        let mixed = bank.select_mixed("Science", 10, &mut rng);
        assert_eq!(mixed.len(), 6);
        assert_eq!(mixed.iter().filter(|q| q.difficulty == Difficulty::Hard).count(), 2);
    }

    #[test]
    fn test_invalid_questions_are_dropped() {
        let mut broken = question("Science", Difficulty::Easy, 0);
        broken.options.pop();
        let bank = QuestionBank::from_questions(vec![broken, question("Science", Difficulty::Easy, 1)]);
        assert_eq!(bank.questions().len(), 1);
    }
}
