// src/models/quiz_record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{mode::Mode, question::Difficulty};
use crate::quiz::{scoring::ScoreResult, session::QuizSession};

/// Represents the 'quiz_history' table in the database.
/// One row per finished quiz attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizRecord {
    pub id: i64,
    pub username: String,
    pub category: String,

    #[sqlx(try_from = "String")]
    pub difficulty: Difficulty,

    #[sqlx(try_from = "String")]
    pub mode: Mode,

    pub total_questions: i64,
    pub correct: i64,
    pub wrong: i64,
    pub score: i64,
    pub percentage: f64,

    /// Seconds spent answering, summed over every question presented.
    pub time_taken: f64,

    pub played_at: DateTime<Utc>,
}

/// A finished attempt ready to be written to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuizRecord {
    pub username: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub total_questions: u32,
    pub correct: u32,
    pub wrong: u32,
    pub score: u32,
    pub percentage: f64,
    pub time_taken: f64,
}

impl NewQuizRecord {
    pub fn from_result(username: &str, session: &QuizSession, result: &ScoreResult) -> Self {
        Self {
            username: username.to_string(),
            category: session.category().to_string(),
            difficulty: session.difficulty(),
            mode: session.mode(),
            total_questions: result.total_questions,
            correct: result.correct,
            wrong: result.wrong,
            score: result.score,
            percentage: result.percentage,
            time_taken: result.elapsed_secs,
        }
    }
}

/// Row of the global top-scores table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub username: String,
    pub category: String,

    #[sqlx(try_from = "String")]
    pub difficulty: Difficulty,

    pub score: i64,
    pub percentage: f64,
    pub played_at: DateTime<Utc>,
}

/// Aggregated numbers shown on the dashboard and fed into achievements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStatsSummary {
    pub total_quizzes: usize,
    pub average_score: f64,
    pub average_percentage: f64,
    pub best_score: i64,
    pub best_percentage: f64,
    pub total_correct: i64,
    pub total_questions: i64,
    pub most_attempted_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub average_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyStat {
    pub difficulty: Difficulty,
    pub average_percentage: f64,
    pub attempts: usize,
    pub correct: i64,
    pub total_questions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeStat {
    pub mode: Mode,
    pub average_percentage: f64,
    pub attempts: usize,
    pub average_score: f64,
}
