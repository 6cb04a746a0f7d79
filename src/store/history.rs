// src/store/history.rs

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        mode::Mode,
        question::Difficulty,
        quiz_record::{
            CategoryStat, DifficultyStat, LeaderboardEntry, ModeStat, NewQuizRecord, QuizRecord,
            UserStatsSummary,
        },
    },
};

const RECORD_COLUMNS: &str = "id, username, category, difficulty, mode, total_questions, \
     correct, wrong, score, percentage, time_taken, played_at";

/// Where finished attempts go. Written once per finished quiz; a failed
/// write leaves the caller's result untouched.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends one attempt and returns its row id.
    async fn record(&self, record: &NewQuizRecord) -> Result<i64, AppError>;

    /// Every attempt by `username`, oldest first.
    async fn user_history(&self, username: &str) -> Result<Vec<QuizRecord>, AppError>;

    async fn top_scores(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError>;

    async fn user_stats_summary(&self, username: &str) -> Result<UserStatsSummary, AppError> {
        let history = self.user_history(username).await?;
        Ok(summarize(&history))
    }
}

#[derive(Clone)]
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The `count` most recent attempts, newest first.
    pub async fn recent_attempts(
        &self,
        username: &str,
        count: i64,
    ) -> Result<Vec<QuizRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM quiz_history WHERE username = ? ORDER BY played_at DESC, id DESC LIMIT ?",
            RECORD_COLUMNS
        );
        let records = sqlx::query_as::<_, QuizRecord>(&sql)
            .bind(username)
            .bind(count)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Attempts played between `start` and `end`, both local days inclusive.
    pub async fn filter_by_date_range(
        &self,
        username: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<QuizRecord>, AppError> {
        let history = self.user_history(username).await?;
        Ok(played_between(history, start, end, &Local))
    }

    /// Mean percentage per category. `None` covers every user.
    pub async fn category_statistics(
        &self,
        username: Option<&str>,
    ) -> Result<Vec<CategoryStat>, AppError> {
        let records = self.records_for(username).await?;

        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for r in &records {
            groups.entry(r.category.clone()).or_default().push(r.percentage);
        }

        Ok(groups
            .into_iter()
            .map(|(category, percentages)| CategoryStat {
                category,
                average_percentage: mean(&percentages),
            })
            .collect())
    }

    pub async fn difficulty_statistics(
        &self,
        username: Option<&str>,
    ) -> Result<Vec<DifficultyStat>, AppError> {
        let records = self.records_for(username).await?;

        Ok(Difficulty::ALL
            .into_iter()
            .filter_map(|difficulty| {
                let group: Vec<&QuizRecord> =
                    records.iter().filter(|r| r.difficulty == difficulty).collect();
                if group.is_empty() {
                    return None;
                }
                let percentages: Vec<f64> = group.iter().map(|r| r.percentage).collect();
                Some(DifficultyStat {
                    difficulty,
                    average_percentage: mean(&percentages),
                    attempts: group.len(),
                    correct: group.iter().map(|r| r.correct).sum(),
                    total_questions: group.iter().map(|r| r.total_questions).sum(),
                })
            })
            .collect())
    }

    pub async fn performance_by_mode(&self, username: &str) -> Result<Vec<ModeStat>, AppError> {
        let records = self.user_history(username).await?;

        Ok(Mode::ALL
            .into_iter()
            .filter_map(|mode| {
                let group: Vec<&QuizRecord> = records.iter().filter(|r| r.mode == mode).collect();
                if group.is_empty() {
                    return None;
                }
                let percentages: Vec<f64> = group.iter().map(|r| r.percentage).collect();
                let scores: Vec<f64> = group.iter().map(|r| r.score as f64).collect();
                Some(ModeStat {
                    mode,
                    average_percentage: mean(&percentages),
                    attempts: group.len(),
                    average_score: mean(&scores),
                })
            })
            .collect())
    }

    /// Percentages in the order they were played.
    pub async fn time_series(&self, username: &str) -> Result<Vec<f64>, AppError> {
        let history = self.user_history(username).await?;
        Ok(history.iter().map(|r| r.percentage).collect())
    }

    /// Writes the user's history as a JSON array.
    /// Returns `false` without touching the file when there is nothing to export.
    pub async fn export_user_history(
        &self,
        username: &str,
        path: impl AsRef<Path>,
    ) -> Result<bool, AppError> {
        let history = self.user_history(username).await?;
        if history.is_empty() {
            return Ok(false);
        }

        let json = serde_json::to_string_pretty(&history)?;
        tokio::fs::write(path.as_ref(), json).await.map_err(|e| {
            tracing::error!("Failed to export history to {}: {:?}", path.as_ref().display(), e);
            AppError::from(e)
        })?;
        Ok(true)
    }

    async fn records_for(&self, username: Option<&str>) -> Result<Vec<QuizRecord>, AppError> {
        match username {
            Some(name) => self.user_history(name).await,
            None => {
                let sql = format!("SELECT {} FROM quiz_history ORDER BY played_at, id", RECORD_COLUMNS);
                Ok(sqlx::query_as::<_, QuizRecord>(&sql)
                    .fetch_all(&self.pool)
                    .await?)
            }
        }
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn record(&self, record: &NewQuizRecord) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO quiz_history (
                username, category, difficulty, mode, total_questions,
                correct, wrong, score, percentage, time_taken, played_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.username)
        .bind(&record.category)
        .bind(record.difficulty.as_str())
        .bind(record.mode.as_str())
        .bind(record.total_questions as i64)
        .bind(record.correct as i64)
        .bind(record.wrong as i64)
        .bind(record.score as i64)
        .bind(record.percentage)
        .bind(record.time_taken)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record quiz attempt: {:?}", e);
            AppError::from(e)
        })?;

        tracing::info!(
            "Recorded {} quiz for {}: score {} ({:.1}%)",
            record.mode,
            record.username,
            record.score,
            record.percentage
        );
        Ok(result.last_insert_rowid())
    }

    async fn user_history(&self, username: &str) -> Result<Vec<QuizRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM quiz_history WHERE username = ? ORDER BY played_at, id",
            RECORD_COLUMNS
        );
        let records = sqlx::query_as::<_, QuizRecord>(&sql)
            .bind(username)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn top_scores(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT username, category, difficulty, score, percentage, played_at
            FROM quiz_history
            ORDER BY score DESC, played_at
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::from(e)
        })?;
        Ok(entries)
    }
}

/// Dashboard numbers over one user's attempts.
pub fn summarize(history: &[QuizRecord]) -> UserStatsSummary {
    if history.is_empty() {
        return UserStatsSummary::default();
    }

    let scores: Vec<f64> = history.iter().map(|r| r.score as f64).collect();
    let percentages: Vec<f64> = history.iter().map(|r| r.percentage).collect();

    // Ties go to the alphabetically first category.
    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for r in history {
        *by_category.entry(r.category.as_str()).or_default() += 1;
    }
    let mut most_attempted: Option<(&str, usize)> = None;
    for (category, n) in by_category {
        if most_attempted.is_none_or(|(_, best)| n > best) {
            most_attempted = Some((category, n));
        }
    }

    UserStatsSummary {
        total_quizzes: history.len(),
        average_score: mean(&scores),
        average_percentage: mean(&percentages),
        best_score: history.iter().map(|r| r.score).max().unwrap_or(0),
        best_percentage: percentages.iter().copied().fold(0.0, f64::max),
        total_correct: history.iter().map(|r| r.correct).sum(),
        total_questions: history.iter().map(|r| r.total_questions).sum(),
        most_attempted_category: most_attempted.map(|(c, _)| c.to_string()),
    }
}

/// Keeps records whose calendar day in `tz` lies in `start..=end`.
pub fn played_between<Tz: TimeZone>(
    records: Vec<QuizRecord>,
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> Vec<QuizRecord> {
    records
        .into_iter()
        .filter(|r| {
            let day = r.played_at.with_timezone(tz).date_naive();
            day >= start && day <= end
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    crate::quiz::scoring::statistics(values).mean
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset};

    use super::*;

    fn played_at(rfc3339: &str) -> QuizRecord {
        QuizRecord {
            id: 1,
            username: "alice".to_string(),
            category: "Science".to_string(),
            difficulty: Difficulty::Easy,
            mode: Mode::Practice,
            total_questions: 10,
            correct: 5,
            wrong: 5,
            score: 50,
            percentage: 50.0,
            time_taken: 20.0,
            played_at: DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_uses_day_in_given_zone() {
        // 18 Oct 12:00 UTC is already 19 Oct in UTC+14.
        let kiritimati = FixedOffset::east_opt(14 * 3600).unwrap();
        let records = vec![played_at("2026-10-18T12:00:00Z")];

        let local = played_between(records.clone(), day(2026, 10, 19), day(2026, 10, 19), &kiritimati);
        assert_eq!(local.len(), 1);

        let utc_day = played_between(records.clone(), day(2026, 10, 18), day(2026, 10, 18), &kiritimati);
        assert!(utc_day.is_empty());

        assert_eq!(
            played_between(records, day(2026, 10, 18), day(2026, 10, 18), &Utc).len(),
            1
        );
    }

    #[test]
    fn test_range_is_inclusive() {
        let records = vec![
            played_at("2026-10-01T08:00:00Z"),
            played_at("2026-10-05T08:00:00Z"),
            played_at("2026-10-06T08:00:00Z"),
        ];
        let hits = played_between(records, day(2026, 10, 1), day(2026, 10, 5), &Utc);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_summary_of_empty_history() {
        assert_eq!(summarize(&[]), UserStatsSummary::default());
    }
}
