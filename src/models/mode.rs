use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Play mode. Decides which session rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Untimed, full feedback after every answer.
    Practice,
    /// Per-question countdown with speed bonuses.
    Timed,
    /// Limited lives, multiplier for long runs.
    Survival,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Practice, Mode::Timed, Mode::Survival];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Practice => "Practice",
            Mode::Timed => "Timed",
            Mode::Survival => "Survival",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(Mode::Practice),
            "timed" => Ok(Mode::Timed),
            "survival" => Ok(Mode::Survival),
            other => Err(AppError::BadRequest(format!("Unknown mode '{}'", other))),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
