// src/store/achievements.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        achievement::{self, ACHIEVEMENTS, Achievement, AchievementOverview, AchievementStats},
        mode::Mode,
        question::Difficulty,
        quiz_record::QuizRecord,
    },
    store::{
        history::{HistoryStore, SqliteHistory, summarize},
        settings,
    },
};

/// Achievement ids the user already holds, in unlock order.
pub async fn load_unlocked(pool: &SqlitePool, username: &str) -> Result<Vec<String>, AppError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT achievement_id FROM achievements WHERE username = ? ORDER BY unlocked_at, achievement_id",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Returns `true` only when the row is new.
pub async fn unlock(pool: &SqlitePool, username: &str, id: &str) -> Result<bool, AppError> {
    if achievement::find(id).is_none() {
        return Err(AppError::NotFound(format!("Achievement '{}'", id)));
    }

    let result = sqlx::query(
        "INSERT OR IGNORE INTO achievements (username, achievement_id, unlocked_at) VALUES (?, ?, ?)",
    )
    .bind(username)
    .bind(id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub fn stats_from(history: &[QuizRecord], streak_count: i64) -> AchievementStats {
    let summary = summarize(history);
    AchievementStats {
        total_quizzes: summary.total_quizzes,
        best_percentage: summary.best_percentage,
        average_percentage: summary.average_percentage,
        streak_count,
        timed_quizzes: history.iter().filter(|r| r.mode == Mode::Timed).count(),
        survival_quizzes: history.iter().filter(|r| r.mode == Mode::Survival).count(),
        hard_quizzes: history.iter().filter(|r| r.difficulty == Difficulty::Hard).count(),
        total_correct: summary.total_correct,
    }
}

/// Unlocks every catalogue entry the user's record now satisfies and
/// returns the ones that were new.
pub async fn check_and_unlock(
    pool: &SqlitePool,
    username: &str,
) -> Result<Vec<&'static Achievement>, AppError> {
    let history = SqliteHistory::new(pool.clone()).user_history(username).await?;
    let streak = settings::get(pool, username).await?.streak_count;
    let stats = stats_from(&history, streak);

    let already = load_unlocked(pool, username).await?;
    let mut unlocked = Vec::new();
    for entry in achievement::newly_satisfied(&stats, &already) {
        if unlock(pool, username, entry.id).await? {
            tracing::info!("{} unlocked achievement '{}'", username, entry.name);
            unlocked.push(entry);
        }
    }
    Ok(unlocked)
}

pub async fn overview(pool: &SqlitePool, username: &str) -> Result<AchievementOverview, AppError> {
    let held = load_unlocked(pool, username).await?;

    let (unlocked, locked): (Vec<&'static Achievement>, Vec<&'static Achievement>) = ACHIEVEMENTS
        .iter()
        .partition(|a| held.iter().any(|id| id == a.id));

    Ok(AchievementOverview {
        total: ACHIEVEMENTS.len(),
        unlocked_count: unlocked.len(),
        unlocked,
        locked,
    })
}
