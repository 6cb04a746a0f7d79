// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Seconds a learner gets per question in Timed mode.
pub const QUESTION_TIME_LIMIT_SECS: u64 = 15;

/// Hint lifelines per session.
pub const MAX_HINTS: u32 = 3;

/// Wrong answers a Survival run can absorb before it ends.
pub const SURVIVAL_LIVES: u32 = 3;

pub const DEFAULT_QUESTION_COUNT: usize = 10;

pub const LEADERBOARD_SIZE: i64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub log_dir: String,
    pub question_bank_path: String,
    /// Terminal bell on answer feedback. Per-user settings can still mute it.
    pub sound_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://quiz.db".to_string(),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            question_bank_path: "data/questions.json".to_string(),
            sound_enabled: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let default = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(default.database_url);

        let rust_log = env::var("RUST_LOG").unwrap_or(default.rust_log);

        let log_dir = env::var("LOG_DIR").unwrap_or(default.log_dir);

        let question_bank_path =
            env::var("QUESTION_BANK_PATH").unwrap_or(default.question_bank_path);

        let sound_enabled = env::var("SOUND_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.sound_enabled);

        Self {
            database_url,
            rust_log,
            log_dir,
            question_bank_path,
            sound_enabled,
        }
    }
}
