// src/store/settings.rs

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::{error::AppError, models::user::UserSettings};

/// Streak after playing on `today`, given the last day played.
/// Same day keeps the count, the following day extends it, anything else restarts at 1.
pub fn next_streak(last_played: Option<NaiveDate>, current: i64, today: NaiveDate) -> i64 {
    match last_played {
        None => 1,
        Some(last) if last == today => current.max(1),
        Some(last) if last.succ_opt() == Some(today) => current + 1,
        Some(_) => 1,
    }
}

/// Stored settings, or the defaults when the user has none yet.
pub async fn get(pool: &SqlitePool, username: &str) -> Result<UserSettings, AppError> {
    let settings = sqlx::query_as::<_, UserSettings>(
        r#"
        SELECT username, streak_count, last_played_date, daily_challenge_date, theme, sound_enabled
        FROM user_settings
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(settings.unwrap_or_else(|| UserSettings::default_for(username)))
}

async fn ensure_row(pool: &SqlitePool, username: &str) -> Result<(), AppError> {
    sqlx::query("INSERT OR IGNORE INTO user_settings (username) VALUES (?)")
        .bind(username)
        .execute(pool)
        .await?;
    Ok(())
}

/// Records a play on `today` and returns the new streak.
pub async fn update_streak(
    pool: &SqlitePool,
    username: &str,
    today: NaiveDate,
) -> Result<i64, AppError> {
    let current = get(pool, username).await?;
    let streak = next_streak(current.last_played_date, current.streak_count, today);

    ensure_row(pool, username).await?;
    sqlx::query(
        "UPDATE user_settings SET streak_count = ?, last_played_date = ? WHERE username = ?",
    )
    .bind(streak)
    .bind(today)
    .bind(username)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update streak for {}: {:?}", username, e);
        AppError::from(e)
    })?;

    if streak != current.streak_count {
        tracing::info!("{} is on a {}-day streak", username, streak);
    }
    Ok(streak)
}

/// One daily challenge per calendar day.
pub async fn can_play_daily_challenge(
    pool: &SqlitePool,
    username: &str,
    today: NaiveDate,
) -> Result<bool, AppError> {
    let settings = get(pool, username).await?;
    Ok(settings.daily_challenge_date != Some(today))
}

pub async fn complete_daily_challenge(
    pool: &SqlitePool,
    username: &str,
    today: NaiveDate,
) -> Result<(), AppError> {
    ensure_row(pool, username).await?;
    sqlx::query("UPDATE user_settings SET daily_challenge_date = ? WHERE username = ?")
        .bind(today)
        .bind(username)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_theme(pool: &SqlitePool, username: &str, theme: &str) -> Result<(), AppError> {
    if !matches!(theme, "light" | "dark") {
        return Err(AppError::BadRequest(format!("Unknown theme '{}'", theme)));
    }

    ensure_row(pool, username).await?;
    sqlx::query("UPDATE user_settings SET theme = ? WHERE username = ?")
        .bind(theme)
        .bind(username)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_sound_enabled(
    pool: &SqlitePool,
    username: &str,
    enabled: bool,
) -> Result<(), AppError> {
    ensure_row(pool, username).await?;
    sqlx::query("UPDATE user_settings SET sound_enabled = ? WHERE username = ?")
        .bind(enabled)
        .bind(username)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_first_play_starts_streak() {
        assert_eq!(next_streak(None, 0, day(1)), 1);
    }

    #[test]
    fn test_same_day_keeps_streak() {
        assert_eq!(next_streak(Some(day(4)), 3, day(4)), 3);
    }

    #[test]
    fn test_next_day_extends_streak() {
        assert_eq!(next_streak(Some(day(4)), 3, day(5)), 4);
    }

    #[test]
    fn test_gap_resets_streak() {
        assert_eq!(next_streak(Some(day(1)), 7, day(5)), 1);
    }

    #[test]
    fn test_month_boundary() {
        let last = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert_eq!(next_streak(Some(last), 2, day(1)), 3);
    }
}
